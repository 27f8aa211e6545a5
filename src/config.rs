use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_CONFIG_FILE: &str = "acenext.toml";
const ENV_PREFIX: &str = "ACENEXT";

/// What to do when the backend cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DegradePolicy {
    /// Substitute locally generated data and keep going.
    #[default]
    Synthetic,
    /// Surface the failure to the caller.
    Strict,
}

impl DegradePolicy {
    pub fn allows_synthetic(self) -> bool {
        matches!(self, DegradePolicy::Synthetic)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend_url: String,
    pub request_timeout_secs: u64,
    pub frame_interval_ms: u64,
    pub video_fallback_ms: u64,
    pub audio_fallback_ms: u64,
    pub recorder_chunk_ms: u64,
    pub clock_tick_ms: u64,
    pub redirect_delay_ms: u64,
    pub landing_delay_ms: u64,
    pub tip_delay_ms: u64,
    pub notification_ms: u64,
    pub degrade_policy: DegradePolicy,
    pub enforce_end_gate: bool,
    pub storage_path: PathBuf,
    pub report_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout_secs: 30,
            frame_interval_ms: 5000,
            video_fallback_ms: 3000,
            audio_fallback_ms: 2000,
            recorder_chunk_ms: 250,
            clock_tick_ms: 1000,
            redirect_delay_ms: 1500,
            landing_delay_ms: 1000,
            tip_delay_ms: 2000,
            notification_ms: 4000,
            degrade_policy: DegradePolicy::Synthetic,
            enforce_end_gate: false,
            storage_path: default_storage_path(),
            report_dir: PathBuf::from("."),
        }
    }
}

/// Platform data directory, falling back to the working directory.
fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("acenext"))
        .unwrap_or_else(|| PathBuf::from(".acenext"))
        .join("local_storage.json")
}

impl Settings {
    /// Layers defaults, an optional TOML file and `ACENEXT_*` environment
    /// variables, in that order.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        // A missing .env is fine
        dotenvy::dotenv().ok();

        let file_source = match config_file {
            Some(path) => File::from(path.to_path_buf()).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file_source)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        info!("⚙️ Configuration loaded (backend: {})", settings.backend_url);
        if !settings.degrade_policy.allows_synthetic() {
            warn!("Strict degrade policy active - backend failures will not be masked");
        }
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.backend_url)
            .with_context(|| format!("backend_url is not a valid URL: {}", self.backend_url))?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn video_fallback(&self) -> Duration {
        Duration::from_millis(self.video_fallback_ms)
    }

    pub fn audio_fallback(&self) -> Duration {
        Duration::from_millis(self.audio_fallback_ms)
    }

    pub fn recorder_chunk(&self) -> Duration {
        Duration::from_millis(self.recorder_chunk_ms)
    }

    pub fn clock_tick(&self) -> Duration {
        Duration::from_millis(self.clock_tick_ms)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    pub fn landing_delay(&self) -> Duration {
        Duration::from_millis(self.landing_delay_ms)
    }

    pub fn tip_delay(&self) -> Duration {
        Duration::from_millis(self.tip_delay_ms)
    }

    pub fn notification_lifetime(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }
}
