use anyhow::{Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::Path;
use vitrine_core::Project;

use super::write_project;
use crate::config::VitrineConfig;

pub fn make_subcommand() -> Command {
    super::add_project_args(Command::new("init"))
        .about("Write a starter project document")
        .arg(
            Arg::new("force")
                .short('f')
                .long("force")
                .help("Overwrite an existing project file")
                .action(ArgAction::SetTrue),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = VitrineConfig::load(args)?;
    let path = Path::new(&config.build_config().project);

    if path.exists() && !args.get_flag("force") {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    write_project(path, &Project::starter())?;
    tracing::info!("Wrote starter project to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starter_documents_read_back_as_the_starter() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["project.json", "project.toml"] {
            let path = dir.path().join(name);
            write_project(&path, &Project::starter()).unwrap();
            assert_eq!(Project::read(&path).unwrap(), Project::starter(), "{name}");
        }
    }
}
