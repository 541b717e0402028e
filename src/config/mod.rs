use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
    #[serde(default)]
    uploads: Uploads,
    #[serde(default)]
    reminders: Reminders,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    jwt: String,
    database_uri: String,
    #[serde(default)]
    docs: bool,
    #[serde(default = "default_session_hours")]
    session_hours: i64,
    admin: Option<BootstrapAdmin>,
}

/// Account created on start-up when no user with this name exists.
#[derive(Debug, Deserialize)]
pub struct BootstrapAdmin {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct Uploads {
    dir: String,
    max_bytes: usize,
    allowed_extensions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Reminders {
    interval_secs: u64,
    inactivity_days: i64,
    remind_every_hours: i64,
}

fn default_session_hours() -> i64 {
    24
}

impl Default for Uploads {
    fn default() -> Self {
        Self {
            dir: String::from("uploads"),
            max_bytes: 10 * 1024 * 1024,
            allowed_extensions: ["pdf", "zip", "png", "jpg", "jpeg", "txt", "md"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Default for Reminders {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            inactivity_days: 7,
            remind_every_hours: 24,
        }
    }
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let read_cfg = |use_local| -> ConfigResult<Self> {
                    let bytes = read_config(use_local)?;
                    let config: Self = toml::from_slice(&bytes)?;
                    Ok(config)
                };

                let config = match read_cfg(use_local) {
                    Ok(c) => c,
                    Err(e) => {
                        if !matches!(e, error::ConfigError::ConfigNotFound) {
                            crate::error::log_error(&e);
                        }
                        tracing::error!("Config not found.");
                        std::process::exit(1);
                    }
                };

                config
            })
            .await
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[inline]
    pub fn uploads(&self) -> &Uploads {
        &self.uploads
    }

    #[inline]
    pub fn reminders(&self) -> &Reminders {
        &self.reminders
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    #[inline]
    pub fn database_uri(&self) -> &str {
        &self.database_uri
    }

    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }

    #[inline]
    pub fn session_hours(&self) -> i64 {
        self.session_hours
    }

    #[inline]
    pub fn admin(&self) -> Option<&BootstrapAdmin> {
        self.admin.as_ref()
    }
}

impl BootstrapAdmin {
    #[inline]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[inline]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Uploads {
    #[inline]
    pub fn dir(&self) -> &str {
        &self.dir
    }

    #[inline]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    #[inline]
    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }
}

impl Reminders {
    #[inline]
    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    #[inline]
    pub fn inactivity_days(&self) -> i64 {
        self.inactivity_days
    }

    #[inline]
    pub fn remind_every_hours(&self) -> i64 {
        self.remind_every_hours
    }
}
