use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::images::DEFAULT_PLACEHOLDER_BASE;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parsing(#[from] toml::de::Error),
}

/// Knobs that change what the engine renders. Two renders with equal options
/// and equal projects produce identical markup.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RenderOptions {
    pub currency_symbol: String,
    pub placeholder_base: String,
    /// Directory with a `page.html` replacing the built-in page shell.
    pub template_dir: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            currency_symbol: "$".into(),
            placeholder_base: DEFAULT_PLACEHOLDER_BASE.into(),
            template_dir: None,
        }
    }
}

impl RenderOptions {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let options: RenderOptions = toml::from_str(&data)?;

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let options: RenderOptions = toml::from_str("currency_symbol = \"€\"").unwrap();
        assert_eq!(options.currency_symbol, "€");
        assert_eq!(options.placeholder_base, DEFAULT_PLACEHOLDER_BASE);
        assert_eq!(options.template_dir, None);
    }

    #[test]
    fn read_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.toml");
        std::fs::write(&path, "currency_symbol = [").unwrap();
        assert!(matches!(
            RenderOptions::read(&path),
            Err(ConfigError::Parsing(_))
        ));
    }
}
