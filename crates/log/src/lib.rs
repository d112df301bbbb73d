//! # Rotor Log
//!
//! Zero-config logging for the rotation services, built on `tracing`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! fn main() -> Result<(), rotor_log::LogError> {
//!     let _guard = rotor_log::auto_init()?;
//!     tracing::info!(kind = "authz_policy", "rotation service ready");
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

mod builder;
mod config;
mod error;

pub use builder::{LoggerBuilder, LoggerGuard};
pub use config::{Config, DisplayConfig, Format, WriterConfig};
pub use error::{LogError, LogResult};

/// Environment variable holding the filter directive.
pub const ENV_FILTER: &str = "ROTOR_LOG";
/// Environment variable selecting the output format.
pub const ENV_FORMAT: &str = "ROTOR_LOG_FORMAT";

/// Pick a configuration from the environment and the build profile.
///
/// An explicit `ROTOR_LOG`/`RUST_LOG` wins; otherwise debug builds get the
/// development preset and release builds the production one.
pub fn auto_init() -> LogResult<LoggerGuard> {
    if std::env::var(ENV_FILTER).is_ok() || std::env::var("RUST_LOG").is_ok() {
        init_with(Config::from_env())
    } else if cfg!(debug_assertions) {
        init_with(Config::development())
    } else {
        init_with(Config::production())
    }
}

/// Initialize with the default configuration.
pub fn init() -> LogResult<LoggerGuard> {
    init_with(Config::default())
}

/// Initialize with a custom configuration.
pub fn init_with(config: Config) -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}

/// Initialize for tests. Safe to call from every test; only the first call
/// installs a subscriber.
pub fn init_test() -> LoggerGuard {
    if tracing::dispatcher::has_been_set() {
        return LoggerGuard::noop();
    }
    init_with(Config::test()).unwrap_or_else(|_| LoggerGuard::noop())
}
