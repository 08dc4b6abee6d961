use serde::Deserialize;
use std::path::Path;

use crate::models::BiasRating;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Directory holding the built frontend
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

fn default_bind_address() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_static_dir() -> String {
    "dist/public".to_string()
}

fn default_page_size() -> i64 {
    10
}

fn default_max_page_size() -> i64 {
    50
}

fn default_is_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    pub bias_rating: BiasRating,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            static_dir: default_static_dir(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            sources: Vec::new(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.max_page_size < 1 || config.default_page_size < 1 {
            anyhow::bail!("page sizes must be positive");
        }
        Ok(config)
    }

    /// Clamp a requested page size to `1..=max_page_size`.
    pub fn page_size(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::from_str("").unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:5000");
        assert_eq!(config.static_dir, "dist/public");
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.max_page_size, 50);
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
            bind_address = "127.0.0.1:8080"
            default_page_size = 12

            [[sources]]
            name = "Associated Press"
            url = "https://apnews.com"
            bias_rating = "center"

            [[sources]]
            name = "Fox News"
            url = "https://foxnews.com"
            bias_rating = "right"
            logo_url = "https://foxnews.com/logo.png"
            is_active = false
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.default_page_size, 12);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].name, "Associated Press");
        assert_eq!(config.sources[0].bias_rating, BiasRating::Center);
        assert!(config.sources[0].is_active);
        assert!(config.sources[0].logo_url.is_none());
        assert_eq!(config.sources[1].bias_rating, BiasRating::Right);
        assert!(!config.sources[1].is_active);
        assert_eq!(
            config.sources[1].logo_url.as_deref(),
            Some("https://foxnews.com/logo.png")
        );
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = Config::load("/nonexistent/path/meridian.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let content = "this is not valid toml {{{";

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let result = Config::load(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_bias_rating_is_rejected() {
        let content = r#"
            [[sources]]
            name = "Somewhere"
            url = "https://example.com"
            bias_rating = "sideways"
        "#;

        assert!(Config::from_str(content).is_err());
    }

    #[test]
    fn test_missing_bias_rating_is_rejected() {
        let content = r#"
            [[sources]]
            name = "Somewhere"
            url = "https://example.com"
        "#;

        assert!(Config::from_str(content).is_err());
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        assert!(Config::from_str("max_page_size = 0").is_err());
    }

    #[test]
    fn test_page_size_clamping() {
        let config = Config::default();

        assert_eq!(config.page_size(None), 10);
        assert_eq!(config.page_size(Some(12)), 12);
        assert_eq!(config.page_size(Some(0)), 1);
        assert_eq!(config.page_size(Some(-3)), 1);
        assert_eq!(config.page_size(Some(500)), 50);
    }
}
