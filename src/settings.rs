//! Upload settings and service endpoints
//!
//! Settings are read from a TOML file. Every field is optional; anything
//! left out keeps its default.
//!
//! ```toml
//! verbose = true
//! swimlane = "per_user"
//! use_border_color = true
//! border_color = "#008080"
//! title = "timestamp"
//! header = "username"
//! nickname = "Ada"
//!
//! [service]
//! api_base_url = "https://api.example.com"
//! request_timeout_secs = 10
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::color::{self, Rgba, SuggestedBorderColor};
use crate::placement::SwimlaneStrategy;

/// Environment variable overriding the API base URL
pub const API_BASE_URL_ENV: &str = "CANVAS_UPLOAD_API_BASE_URL";
/// Environment variable overriding the web client base URL
pub const CLIENT_BASE_URL_ENV: &str = "CANVAS_UPLOAD_CLIENT_BASE_URL";

/// Errors that can occur when loading settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(
        "border color '{0}' is not a #rrggbb hex color (suggested: {suggested})",
        suggested = SuggestedBorderColor::hex_list()
    )]
    InvalidColor(String),
}

/// How the canvas name is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasTitleStrategy {
    /// `A1111 | prompt`
    #[default]
    Default,
    /// `txt2img` / `img2img`
    GenerationMode,
    /// The user's nickname
    Username,
    /// The batch timestamp
    Timestamp,
}

/// How the title row inside the canvas is built; the prompt always follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasHeaderStrategy {
    #[default]
    Default,
    GenerationMode,
    Username,
    Timestamp,
}

/// Endpoints and transport settings of the remote service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub api_base_url: String,
    /// Base of links that open a workspace in the browser
    pub client_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.apps.us.bluescape.com".to_string(),
            client_base_url: "https://client.apps.us.bluescape.com".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    /// Apply the URL overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(API_BASE_URL_ENV).ok(),
            std::env::var(CLIENT_BASE_URL_ENV).ok(),
        )
    }

    fn with_overrides(mut self, api: Option<String>, client: Option<String>) -> Self {
        if let Some(api) = api.filter(|s| !s.is_empty()) {
            self.api_base_url = api;
        }
        if let Some(client) = client.filter(|s| !s.is_empty()) {
            self.client_base_url = client;
        }
        self
    }

    /// Browser link that opens a workspace focused on one element
    pub fn element_link(&self, workspace_id: &str, element_id: &str) -> String {
        format!(
            "{}/applink/{}?objectId={}",
            self.client_base_url.trim_end_matches('/'),
            workspace_id,
            element_id
        )
    }
}

/// User-facing options for an upload
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Add the extended generation data panel
    pub verbose: bool,
    /// Attach generation metadata traits to canvases and images
    pub metadata: bool,
    pub swimlane: SwimlaneStrategy,
    pub use_border_color: bool,
    pub border_color: String,
    pub title: CanvasTitleStrategy,
    pub header: CanvasHeaderStrategy,
    pub nickname: String,
    /// Lay out every image at 1000x1000 regardless of its real size
    pub scale_to_standard_size: bool,
    /// Upload img2img source images ahead of the generated ones
    pub include_init_images: bool,
    pub include_mask_image: bool,
    pub service: ServiceConfig,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            verbose: false,
            metadata: true,
            swimlane: SwimlaneStrategy::Shared,
            use_border_color: false,
            border_color: "#ffffff".to_string(),
            title: CanvasTitleStrategy::Default,
            header: CanvasHeaderStrategy::Default,
            nickname: String::new(),
            scale_to_standard_size: true,
            include_init_images: true,
            include_mask_image: false,
            service: ServiceConfig::default(),
        }
    }
}

impl UploadSettings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load settings from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, SettingsError> {
        let settings: UploadSettings = toml::from_str(content)?;
        if settings.use_border_color && !color::is_hex_color(&settings.border_color) {
            return Err(SettingsError::InvalidColor(settings.border_color));
        }
        Ok(settings)
    }

    /// Border colour of new canvases: the custom colour when enabled and valid, else white
    pub fn canvas_border_color(&self) -> Rgba {
        if !self.use_border_color {
            return color::WHITE;
        }
        Rgba::from_hex(&self.border_color).unwrap_or(color::WHITE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let settings = UploadSettings::default();
        assert!(!settings.verbose);
        assert!(settings.metadata);
        assert!(settings.scale_to_standard_size);
        assert_eq!(settings.swimlane, SwimlaneStrategy::Shared);
        assert_eq!(settings.service.request_timeout_secs, 30);
        assert_eq!(settings.canvas_border_color(), color::WHITE);
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(UploadSettings::from_str("").unwrap(), UploadSettings::default());
    }

    #[test]
    fn test_parse_full() {
        let toml_str = r##"
verbose = true
metadata = false
swimlane = "per_user"
use_border_color = true
border_color = "#008080"
title = "generation_mode"
header = "timestamp"
nickname = "Ada"

[service]
api_base_url = "https://api.example.com"
request_timeout_secs = 5
"##;
        let settings = UploadSettings::from_str(toml_str).expect("Should parse");
        assert!(settings.verbose);
        assert!(!settings.metadata);
        assert_eq!(settings.swimlane, SwimlaneStrategy::PerUser);
        assert_eq!(settings.title, CanvasTitleStrategy::GenerationMode);
        assert_eq!(settings.header, CanvasHeaderStrategy::Timestamp);
        assert_eq!(settings.canvas_border_color(), Rgba::opaque(0, 128, 128));
        assert_eq!(settings.service.api_base_url, "https://api.example.com");
        assert_eq!(settings.service.request_timeout_secs, 5);
        assert_eq!(
            settings.service.client_base_url,
            ServiceConfig::default().client_base_url
        );
    }

    #[test]
    fn test_invalid_border_color() {
        let result = UploadSettings::from_str("use_border_color = true\nborder_color = \"teal\"");
        let err = result.unwrap_err();
        assert!(matches!(err, SettingsError::InvalidColor(_)));
        assert!(err.to_string().contains("#008080"));
    }

    #[test]
    fn test_unused_invalid_border_color_is_ignored() {
        let settings = UploadSettings::from_str("border_color = \"teal\"").unwrap();
        assert_eq!(settings.canvas_border_color(), color::WHITE);
    }

    #[test]
    fn test_invalid_toml_error() {
        assert!(matches!(
            UploadSettings::from_str("this is not valid toml {{{{"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::default()
            .with_overrides(Some("http://localhost:9000".to_string()), Some(String::new()));
        assert_eq!(config.api_base_url, "http://localhost:9000");
        assert_eq!(config.client_base_url, ServiceConfig::default().client_base_url);
    }

    #[test]
    fn test_element_link() {
        let config = ServiceConfig {
            client_base_url: "https://client.example.com/".to_string(),
            ..ServiceConfig::default()
        };
        assert_eq!(
            config.element_link("ws", "el-1"),
            "https://client.example.com/applink/ws?objectId=el-1"
        );
    }
}
