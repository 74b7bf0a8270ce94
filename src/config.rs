//! CLI configuration
//!
//! Profiles live in `~/.saseconn/config.toml` or `config.<profile>.toml`.
//! Command-line flags and environment variables override file values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::api::http::{Credentials, DEFAULT_API_URL, DEFAULT_AUTH_URL};
use crate::{Result, SaseError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api_url: Option<String>,
    pub auth_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub tsg_id: Option<String>,
    pub log_level: Option<String>,
    pub default_format: Option<String>,
}

impl Config {
    pub fn load(profile: Option<&str>) -> Result<Self> {
        let path = Self::config_path(profile)?;
        if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| SaseError::Config(format!("{}: {}", path.display(), e)))?;
            Self::parse(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SaseError::Config(e.to_string()))
    }

    fn config_path(profile: Option<&str>) -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SaseError::Config("Cannot find home directory".into()))?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".saseconn").join(filename))
    }

    /// Values from `other` win where set
    pub fn merge(self, other: Config) -> Self {
        Self {
            api_url: other.api_url.or(self.api_url),
            auth_url: other.auth_url.or(self.auth_url),
            client_id: other.client_id.or(self.client_id),
            client_secret: other.client_secret.or(self.client_secret),
            tsg_id: other.tsg_id.or(self.tsg_id),
            log_level: other.log_level.or(self.log_level),
            default_format: other.default_format.or(self.default_format),
        }
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn auth_url(&self) -> &str {
        self.auth_url.as_deref().unwrap_or(DEFAULT_AUTH_URL)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Service account credentials, all three required
    pub fn credentials(&self) -> Result<Credentials> {
        let field = |value: &Option<String>, name: &str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| SaseError::Config(format!("{} not set", name)))
        };

        Ok(Credentials {
            client_id: field(&self.client_id, "client_id")?,
            client_secret: field(&self.client_secret, "client_secret")?,
            tsg_id: field(&self.tsg_id, "tsg_id")?,
        })
    }

    /// Client id safe for logs
    pub fn masked_client_id(&self) -> String {
        self.client_id
            .as_ref()
            .map(|k| format!("{}****", &k[..k.char_indices().nth(4).map_or(k.len(), |(i, _)| i)]))
            .unwrap_or_else(|| "(not set)".into())
    }
}
