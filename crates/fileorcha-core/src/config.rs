//! Configuration module
//!
//! Client settings are read from the environment (after loading `.env`), with
//! defaults matching a local development server.

use std::env;
use std::path::PathBuf;

use crate::preview::DEFAULT_TEXT_PREVIEW_CHARS;
use crate::validation::ValidationRules;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const MAX_FILE_SIZE_MB: u64 = 50;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const NOTIFICATION_TTL_SECS: u64 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    /// Origin used when building share links; usually the public site URL.
    pub public_origin: String,
    pub max_file_size_mb: u64,
    pub allowed_content_types: Vec<String>,
    pub expiry_enabled: bool,
    /// Append the password to share links.
    pub share_password_in_link: bool,
    /// Pre-fill the password when testing a download of the last upload.
    pub echo_password: bool,
    pub request_timeout_secs: u64,
    pub notification_ttl_secs: u64,
    pub text_preview_chars: usize,
    pub config_dir: PathBuf,
    pub download_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            public_origin: DEFAULT_API_URL.to_string(),
            max_file_size_mb: MAX_FILE_SIZE_MB,
            allowed_content_types: Vec::new(),
            expiry_enabled: true,
            share_password_in_link: false,
            echo_password: true,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            notification_ttl_secs: NOTIFICATION_TTL_SECS,
            text_preview_chars: DEFAULT_TEXT_PREVIEW_CHARS,
            config_dir: default_config_dir(),
            download_dir: default_download_dir(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let api_url = env::var("FILEORCHA_API_URL")
            .or_else(|_| env::var("API_URL"))
            .unwrap_or(defaults.api_url)
            .trim_end_matches('/')
            .to_string();

        let public_origin = env::var("FILEORCHA_PUBLIC_ORIGIN")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| api_url.clone());

        let config = ClientConfig {
            api_url,
            public_origin,
            max_file_size_mb: env::var("FILEORCHA_MAX_FILE_SIZE_MB")
                .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
                .parse()
                .unwrap_or(MAX_FILE_SIZE_MB),
            allowed_content_types: parse_list(
                &env::var("FILEORCHA_ALLOWED_CONTENT_TYPES").unwrap_or_default(),
            ),
            expiry_enabled: parse_bool(env::var("FILEORCHA_EXPIRY_ENABLED").ok(), true),
            share_password_in_link: parse_bool(
                env::var("FILEORCHA_SHARE_PASSWORD_IN_LINK").ok(),
                false,
            ),
            echo_password: parse_bool(env::var("FILEORCHA_ECHO_PASSWORD").ok(), true),
            request_timeout_secs: env::var("FILEORCHA_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| REQUEST_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(REQUEST_TIMEOUT_SECS),
            notification_ttl_secs: env::var("FILEORCHA_NOTIFICATION_TTL_SECS")
                .unwrap_or_else(|_| NOTIFICATION_TTL_SECS.to_string())
                .parse()
                .unwrap_or(NOTIFICATION_TTL_SECS),
            text_preview_chars: env::var("FILEORCHA_TEXT_PREVIEW_CHARS")
                .unwrap_or_else(|_| DEFAULT_TEXT_PREVIEW_CHARS.to_string())
                .parse()
                .unwrap_or(DEFAULT_TEXT_PREVIEW_CHARS),
            config_dir: env::var("FILEORCHA_CONFIG_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.config_dir),
            download_dir: env::var("FILEORCHA_DOWNLOAD_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        for (name, url) in [
            ("FILEORCHA_API_URL", &self.api_url),
            ("FILEORCHA_PUBLIC_ORIGIN", &self.public_origin),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow::anyhow!(
                    "{} must be an http:// or https:// URL, got '{}'",
                    name,
                    url
                ));
            }
        }

        if self.max_file_size_mb == 0 {
            return Err(anyhow::anyhow!(
                "FILEORCHA_MAX_FILE_SIZE_MB must be greater than zero"
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "FILEORCHA_REQUEST_TIMEOUT_SECS must be greater than zero"
            ));
        }

        Ok(())
    }

    /// Override the API URL (e.g. from a command-line flag). The share-link
    /// origin follows unless it was configured separately.
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        let api_url = api_url.trim_end_matches('/').to_string();
        if self.public_origin == self.api_url {
            self.public_origin = api_url.clone();
        }
        self.api_url = api_url;
        self
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            max_file_size_bytes: self.max_file_size_mb.saturating_mul(1024 * 1024),
            allowed_content_types: self.allowed_content_types.clone(),
            expiry_enabled: self.expiry_enabled,
        }
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.config_dir.join("preferences.json")
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fileorcha")
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    raw.map(|s| s.trim().to_lowercase())
        .and_then(|s| match s.as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        let rules = config.validation_rules();
        assert_eq!(rules.max_file_size_bytes, 50 * 1024 * 1024);
        assert!(rules.allowed_content_types.is_empty());
        assert!(config.preferences_path().ends_with("preferences.json"));
    }

    #[test]
    fn rejects_non_http_urls_and_zero_limits() {
        let config = ClientConfig {
            api_url: "ftp://example.com".to_string(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ClientConfig {
            max_file_size_mb: 0,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn huge_size_limit_saturates() {
        let config = ClientConfig {
            max_file_size_mb: u64::MAX / 1024,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.validation_rules().max_file_size_bytes, u64::MAX);
    }

    #[test]
    fn api_url_override_moves_default_origin() {
        let config = ClientConfig::default().with_api_url("https://share.example.com/");
        assert_eq!(config.api_url, "https://share.example.com");
        assert_eq!(config.public_origin, "https://share.example.com");

        let config = ClientConfig {
            public_origin: "https://files.example.com".to_string(),
            ..ClientConfig::default()
        }
        .with_api_url("https://api.example.com");
        assert_eq!(config.public_origin, "https://files.example.com");
    }

    #[test]
    fn list_and_bool_parsing() {
        assert_eq!(
            parse_list(" Image/PNG , ,text/plain"),
            vec!["image/png".to_string(), "text/plain".to_string()]
        );
        assert!(parse_list("").is_empty());
        assert!(parse_bool(Some("YES".to_string()), false));
        assert!(!parse_bool(Some("off".to_string()), true));
        assert!(parse_bool(Some("maybe".to_string()), true));
        assert!(!parse_bool(None, false));
    }
}
