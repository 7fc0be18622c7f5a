use anyhow::Result;
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use vitrine_core::RenderOptions;

pub const DEFAULT_CONFIG_FILE: &str = "./vitrine.toml";

/// Complete configuration that merges CLI args, env vars, config files, and defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VitrineConfig {
    pub build: BuildConfig,
    /// Options handed to the page composer
    pub render: RenderOptions,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Project document (JSON or TOML)
    pub project: String,
    /// Output directory for the exported bundle
    pub output: String,
    /// Directory local image paths are relative to
    pub assets: String,
    /// Configuration file path
    pub config: String,
    /// Host for dev server
    pub host: String,
    /// Port for dev server
    pub port: u16,
    /// Open browser automatically
    pub open: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project: "./project.json".to_string(),
            output: "./out".to_string(),
            assets: "./assets".to_string(),
            config: DEFAULT_CONFIG_FILE.to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            open: false,
        }
    }
}

impl VitrineConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (VITRINE_*)
    /// 3. Configuration file
    /// 4. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        let config_file = string_arg(args, "config").unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let mut builder = ConfigBuilder::builder()
            .add_source(ConfigBuilder::try_from(&Self::default())?)
            .add_source(File::from(PathBuf::from(&config_file)).required(false))
            .add_source(
                Environment::with_prefix("VITRINE")
                    .prefix_separator("_")
                    .separator("__"),
            );

        // Only args defined for the running subcommand are looked at
        for (arg, key) in [
            ("project", "build.project"),
            ("output", "build.output"),
            ("assets", "build.assets"),
            ("config", "build.config"),
            ("host", "build.host"),
            ("currency", "render.currency_symbol"),
            ("placeholder-base", "render.placeholder_base"),
            ("templates", "render.template_dir"),
        ] {
            if let Some(value) = string_arg(args, arg) {
                builder = builder.set_override(key, value)?;
            }
        }
        if let Some(port) = args.try_get_one::<u16>("port").ok().flatten() {
            builder = builder.set_override("build.port", i64::from(*port))?;
        }
        if args.try_get_one::<bool>("open").ok().flatten() == Some(&true) {
            builder = builder.set_override("build.open", true)?;
        }

        let config: VitrineConfig = builder.build()?.try_deserialize()?;
        tracing::debug!(?config, "configuration loaded");

        Ok(config)
    }

    pub fn build_config(&self) -> &BuildConfig {
        &self.build
    }

    pub fn render_options(&self) -> &RenderOptions {
        &self.render
    }
}

fn string_arg(args: &ArgMatches, name: &str) -> Option<String> {
    args.try_get_one::<String>(name).ok().flatten().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, ArgAction, Command};

    fn command() -> Command {
        Command::new("test")
            .arg(Arg::new("project").long("project"))
            .arg(Arg::new("output").long("output"))
            .arg(Arg::new("config").long("config"))
            .arg(Arg::new("currency").long("currency"))
            .arg(
                Arg::new("port")
                    .long("port")
                    .value_parser(clap::value_parser!(u16)),
            )
            .arg(Arg::new("open").long("open").action(ArgAction::SetTrue))
    }

    #[test]
    fn test_default_config() {
        let config = VitrineConfig::default();
        assert_eq!(config.build.project, "./project.json");
        assert_eq!(config.build.output, "./out");
        assert_eq!(config.build.port, 3000);
        assert_eq!(config.render.currency_symbol, "$");
    }

    #[test]
    fn test_cli_args_override() {
        let matches = command()
            .try_get_matches_from([
                "test",
                "--config",
                "/definitely/missing.toml",
                "--project",
                "/custom/shop.json",
                "--currency",
                "€",
                "--port",
                "8080",
                "--open",
            ])
            .unwrap();

        let config = VitrineConfig::load(&matches).unwrap();
        assert_eq!(config.build.project, "/custom/shop.json");
        assert_eq!(config.build.port, 8080);
        assert!(config.build.open);
        assert_eq!(config.render.currency_symbol, "€");
        // Should still have defaults for non-overridden values
        assert_eq!(config.build.output, "./out");
        assert_eq!(config.render.template_dir, None);
    }

    #[test]
    fn test_file_sits_between_defaults_and_cli() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("vitrine.toml");
        std::fs::write(
            &file,
            "[build]\noutput = \"./dist\"\nport = 4000\n\n[render]\ncurrency_symbol = \"£\"\n",
        )
        .unwrap();
        let file = file.to_string_lossy().into_owned();

        let matches = command()
            .try_get_matches_from(["test", "--config", file.as_str(), "--port", "5000"])
            .unwrap();
        let config = VitrineConfig::load(&matches).unwrap();

        assert_eq!(config.build.output, "./dist");
        assert_eq!(config.build.port, 5000);
        assert_eq!(config.render.currency_symbol, "£");
        assert_eq!(config.build.project, "./project.json");
    }
}
