use anyhow::{Context, Result};
use clap::{Arg, Command};
use std::path::Path;
use vitrine_core::Project;

pub mod build;
pub mod init;
pub mod serve;
pub mod set;

pub fn add_project_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("project")
                .short('p')
                .long("project")
                .value_name("FILE")
                .help("Project document (JSON or TOML) [default: ./project.json]"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file [default: ./vitrine.toml]"),
        )
}

pub fn add_render_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("assets")
                .short('a')
                .long("assets")
                .value_name("DIR")
                .help("Directory local image paths are relative to [default: ./assets]"),
        )
        .arg(
            Arg::new("currency")
                .long("currency")
                .value_name("SYMBOL")
                .help("Currency symbol shown before prices [default: $]"),
        )
        .arg(
            Arg::new("placeholder-base")
                .long("placeholder-base")
                .value_name("URL")
                .help("Base URL for placeholder images"),
        )
        .arg(
            Arg::new("templates")
                .short('t')
                .long("templates")
                .value_name("DIR")
                .help("Directory with a page.html overriding the built-in page shell"),
        )
}

pub fn load_project(path: &Path) -> Result<Project> {
    let project = Project::read(path)
        .with_context(|| format!("Failed to read project {}", path.display()))?;
    tracing::debug!(
        name = %project.name,
        products = project.products.len(),
        "loaded project"
    );
    Ok(project)
}

/// Write a project back in the format its extension names.
pub fn write_project(path: &Path, project: &Project) -> Result<()> {
    let document = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => project.to_toml_string()?,
        _ => project.to_json_string()? + "\n",
    };
    std::fs::write(path, document)
        .with_context(|| format!("Failed to write project {}", path.display()))
}
