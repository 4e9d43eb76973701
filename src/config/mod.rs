// Configuration module entry point
// Layers defaults, an optional config file, environment and command-line overrides

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::RelayError;

// Re-export public types
pub use state::AppState;
pub use types::{CollisionPolicy, Config, FaultPolicy, StorageConfig};

/// Environment variable prefix, e.g. `POST_LOGGER_SERVER__PORT=6000`
pub const ENV_PREFIX: &str = "POST_LOGGER";

/// Values that take precedence over every other configuration source
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub logs_dir: Option<String>,
    pub workers: Option<usize>,
    pub sequential: Option<bool>,
    pub fault_policy: Option<FaultPolicy>,
    pub collision: Option<CollisionPolicy>,
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration from a file path (without extension)
    /// A missing file is not an error; defaults and environment still apply
    pub fn load_from(config_path: &str, overrides: &Overrides) -> Result<Self, config::ConfigError> {
        let workers = overrides.workers.and_then(|w| i64::try_from(w).ok());

        let settings = config::Config::builder()
            .set_default("server.host", "192.168.100.73")?
            .set_default("server.port", 5000)?
            .set_default("server.sequential", false)?
            .set_default("server.shutdown_grace", 5)?
            .set_default("storage.dir", "logs")?
            .set_default("storage.prefix", "socket_server")?
            .set_default("storage.collision", CollisionPolicy::Overwrite.as_str())?
            .set_default("http.fault_policy", FaultPolicy::Respond.as_str())?
            .set_default("performance.keep_alive", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", false)?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", overrides.host.clone())?
            .set_override_option("server.port", overrides.port.map(i64::from))?
            .set_override_option("server.workers", workers)?
            .set_override_option("server.sequential", overrides.sequential)?
            .set_override_option("storage.dir", overrides.logs_dir.clone())?
            .set_override_option(
                "storage.collision",
                overrides.collision.map(CollisionPolicy::as_str),
            )?
            .set_override_option(
                "http.fault_policy",
                overrides.fault_policy.map(FaultPolicy::as_str),
            )?
            .set_override_option("logging.level", overrides.log_level.clone())?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, RelayError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|e| RelayError::InvalidAddress(format!("{addr}: {e}")))
    }
}
