use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use serde_json::Value;
use std::path::Path;
use vitrine_core::FieldPath;

use super::{load_project, write_project};
use crate::config::VitrineConfig;

pub fn make_subcommand() -> Command {
    super::add_project_args(Command::new("set"))
        .about("Change one field of the project document")
        .arg(
            Arg::new("field")
                .required(true)
                .value_name("FIELD")
                .help("Field path, e.g. name, sections.hero_title, theme.accent, products.0.price"),
        )
        .arg(
            Arg::new("value")
                .required(true)
                .value_name("VALUE")
                .help("New value; parsed as JSON when possible, otherwise taken as text"),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = VitrineConfig::load(args)?;
    let path = Path::new(&config.build_config().project);

    let field: FieldPath = args
        .get_one::<String>("field")
        .context("missing field")?
        .parse()?;
    let value = parse_value(args.get_one::<String>("value").context("missing value")?);

    let mut project = load_project(path)?;
    project.update(field, &value)?;

    write_project(path, &project)?;

    tracing::info!("Updated {}", path.display());
    Ok(())
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
