use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use std::path::Path;
use vitrine_core::PageComposer;

use super::load_project;
use crate::config::VitrineConfig;

pub fn make_subcommand() -> Command {
    super::add_render_args(super::add_project_args(Command::new("build")))
        .about("Export the project as a static bundle")
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for the bundle [default: ./out]"),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = VitrineConfig::load(args)?;
    let build_config = config.build_config();

    let project = load_project(Path::new(&build_config.project))?;
    let composer = PageComposer::new(config.render_options().clone())?;
    let bundle = composer.bundle(&project)?;

    let output_dir = Path::new(&build_config.output);
    let assets_dir = Path::new(&build_config.assets);
    bundle.write_to(output_dir, assets_dir.is_dir().then_some(assets_dir))?;

    for url in bundle.external_urls() {
        tracing::debug!("external image: {}", url);
    }
    tracing::info!(
        hash = %bundle.manifest().content_hash,
        "Bundle written to {}",
        output_dir.display()
    );

    Ok(())
}
