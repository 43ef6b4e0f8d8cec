use anyhow::Context;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_BASE_URL: &str = "https://api.libreview.io";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub libreview: LibreViewSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Deserialize, Clone)]
pub struct LibreViewSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub connection_id: String,
    #[serde(default)]
    pub token: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_show_chart")]
    pub show_chart: bool,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_show_chart() -> bool {
    true
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for LibreViewSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connection_id: String::new(),
            token: String::new(),
            timeout_secs: None,
        }
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            show_chart: default_show_chart(),
        }
    }
}

// Keep the bearer token out of logs
impl fmt::Debug for LibreViewSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibreViewSettings")
            .field("base_url", &self.base_url)
            .field("connection_id", &self.connection_id)
            .field("token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl LibreViewSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl DashboardSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Settings {
    fn validate(self) -> anyhow::Result<Self> {
        if self.libreview.token.trim().is_empty() {
            anyhow::bail!("LIBREVIEW_API_KEY is not set");
        }
        if self.libreview.connection_id.trim().is_empty() {
            anyhow::bail!("LibreView connection id is not set (LIBREVIEW_CONNECTION_ID)");
        }
        if self.dashboard.poll_interval_secs == 0 {
            anyhow::bail!("dashboard.poll_interval_secs must be greater than zero");
        }
        Ok(self)
    }
}

/// Load settings from `config/glucose.*`, `GLUCOSE__*` variables and the
/// LibreView credentials in the environment (or `.env`).
pub fn load_settings() -> anyhow::Result<Settings> {
    dotenv::dotenv().ok();

    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/glucose").required(false))
        .add_source(
            config::Environment::with_prefix("GLUCOSE")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("libreview.token", std::env::var("LIBREVIEW_API_KEY").ok())?
        .set_override_option(
            "libreview.connection_id",
            std::env::var("LIBREVIEW_CONNECTION_ID").ok(),
        )?
        .build()
        .context("Failed to read configuration")?;

    settings
        .try_deserialize::<Settings>()
        .context("Invalid configuration")?
        .validate()
}

#[cfg(test)]
fn parse_settings(toml: &str) -> anyhow::Result<Settings> {
    let settings = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    settings.try_deserialize::<Settings>()?.validate()
}
