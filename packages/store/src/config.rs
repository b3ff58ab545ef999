//! # Application configuration: `notekeep.toml`
//!
//! Connection settings for the hosted services, bundled with the web build.
//!
//! ```toml
//! [firebase]
//! api_key = "AIza..."        # web API key of the project
//! project_id = "notekeep"    # document database project
//! poll_interval_secs = 5     # re-run open note lists; 0 turns polling off
//!
//! [media]
//! cloud_name = "dptzo2axj"   # image host account
//! upload_preset = "notes_app" # unsigned upload preset
//! ```
//!
//! | Struct | Purpose |
//! |--------|---------|
//! | [`NotekeepConfig`] | Top-level config with TOML (de)serialisation and the canonical filename. |
//! | [`FirebaseConfig`] | Identity service key, document database project and live-list polling. Empty key or project means "not configured". |
//! | [`MediaConfig`] | Image host account and preset, plus the derived upload URL. |
//!
//! Every section has defaults, so an empty file is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration stored in `notekeep.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NotekeepConfig {
    #[serde(default)]
    pub firebase: FirebaseConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FirebaseConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    5
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            project_id: String::new(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_cloud_name")]
    pub cloud_name: String,
    #[serde(default = "default_upload_preset")]
    pub upload_preset: String,
}

fn default_cloud_name() -> String {
    "dptzo2axj".to_string()
}

fn default_upload_preset() -> String {
    "notes_app".to_string()
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cloud_name: default_cloud_name(),
            upload_preset: default_upload_preset(),
        }
    }
}

impl FirebaseConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.project_id.trim().is_empty()
    }

    /// How often open live queries are re-run, or `None` when polling is off.
    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_secs > 0).then(|| Duration::from_secs(self.poll_interval_secs))
    }
}

impl MediaConfig {
    /// Unsigned image upload endpoint for this account.
    pub fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cloud_name
        )
    }
}

impl NotekeepConfig {
    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "notekeep.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
