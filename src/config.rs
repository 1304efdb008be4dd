//! Rendering configuration
//!
//! Every field has a default, so a partial (or missing) JSON file is fine.
//! The emphasis fallback can also be forced through the environment for
//! terminals that cannot draw italics.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable that switches single emphasis from italic to underline
pub const EMPHASIS_FALLBACK_ENV: &str = "TEXTMATE_VIEW_EMPHASIS_FALLBACK";

/// How single-delimiter emphasis (`*text*`) is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmphasisFallback {
    #[default]
    Italic,
    Underline,
}

impl EmphasisFallback {
    /// Parse the environment override; anything other than "underline" keeps italics
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("underline") {
            Self::Underline
        } else {
            Self::Italic
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Built-in theme name (see `ThemeName`)
    pub theme: String,

    pub emphasis_fallback: EmphasisFallback,

    /// Prefix for `@mention` hyperlinks
    pub mention_base_url: String,

    /// Upper bound for resolving one image source
    pub image_timeout_ms: u64,
    pub image_max_width: u16,
    pub image_max_height: u16,

    /// Idle poll interval of the pager input loop
    pub pager_poll_ms: u64,

    /// Lines per batch for streaming renders
    pub batch_size: usize,

    /// Text between the line-number gutter and the content
    pub gutter_separator: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            theme: crate::primitives::grammar_registry::ThemeName::default()
                .as_str()
                .to_string(),
            emphasis_fallback: EmphasisFallback::Italic,
            mention_base_url: "https://github.com/".to_string(),
            image_timeout_ms: 5_000,
            image_max_width: 80,
            image_max_height: 30,
            pager_poll_ms: 50,
            batch_size: 1000,
            gutter_separator: " │ ".to_string(),
        }
    }
}

impl RenderConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: RenderConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;
        Ok(config.with_env_overrides())
    }

    /// Load the user configuration, falling back to defaults
    ///
    /// Looks for `textmate-view/config.json` under the platform config dir.
    #[cfg(feature = "runtime")]
    pub fn load() -> Self {
        let Some(path) = dirs::config_dir().map(|d| d.join("textmate-view").join("config.json"))
        else {
            return Self::default().with_env_overrides();
        };

        if !path.exists() {
            return Self::default().with_env_overrides();
        }

        match Self::from_file(&path) {
            Ok(config) => {
                tracing::debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("{}; using defaults", e);
                Self::default().with_env_overrides()
            }
        }
    }

    /// Apply environment overrides on top of this configuration
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var(EMPHASIS_FALLBACK_ENV) {
            self.emphasis_fallback = EmphasisFallback::from_env_value(&value);
        }
        self
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }

    pub fn pager_poll_interval(&self) -> Duration {
        Duration::from_millis(self.pager_poll_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.mention_base_url, "https://github.com/");
        assert_eq!(config.image_timeout(), Duration::from_secs(5));
        assert_eq!(config.pager_poll_interval(), Duration::from_millis(50));
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.emphasis_fallback, EmphasisFallback::Italic);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"emphasis_fallback": "underline", "batch_size": 25}}"#).unwrap();

        let config = RenderConfig::from_file(file.path()).unwrap();
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.image_max_width, 80);
        assert_eq!(config.gutter_separator, " │ ");
    }

    #[test]
    fn test_invalid_file_reports_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = RenderConfig::from_file(file.path()).unwrap_err();
        assert!(err.starts_with("Failed to parse config file"));
    }

    #[test]
    fn test_emphasis_env_value() {
        assert_eq!(
            EmphasisFallback::from_env_value("Underline"),
            EmphasisFallback::Underline
        );
        assert_eq!(
            EmphasisFallback::from_env_value("bold"),
            EmphasisFallback::Italic
        );
    }
}
