//! Application configuration, populated from environment variables.

use std::fmt;
use std::time::Duration;

use armature_net::Endpoint;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn name(self) -> &'static str {
        match self {
            Environment::Development => "Development",
            Environment::Staging => "Staging",
            Environment::Production => "Production",
        }
    }

    pub fn default_api_base(self) -> &'static str {
        match self {
            Environment::Development => "https://api-dev.example.com",
            Environment::Staging => "https://api-staging.example.com",
            Environment::Production => "https://api.example.com",
        }
    }

    /// Diagnostics are on outside production.
    pub fn logging_enabled(self) -> bool {
        !matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime configuration for the demo client.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `ARMATURE_ENV` | `development` | `development`, `staging` or `production` |
/// | `ARMATURE_API_BASE` | derived from `ARMATURE_ENV` | API base URL |
/// | `ARMATURE_API_VERSION` | `v1` | Version segment prefixed to every endpoint path |
/// | `ARMATURE_TIMEOUT_SECS` | `30` | Whole-request timeout |
/// | `ARMATURE_OFFLINE` | (absent) | Any value serves canned fixtures instead of HTTP |
/// | `ARMATURE_SIMULATED_DELAY_MS` | `1000` | Latency of simulated loads and offline fixtures |
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub environment: Environment,

    /// Example: `"https://api.example.com"`.
    pub api_base: String,

    pub api_version: String,

    pub timeout: Duration,

    /// Serve fixtures instead of talking to `api_base`.
    pub offline: bool,

    /// How long simulated loads (profile, settings, fixtures) take.
    pub simulated_delay: Duration,

    pub app_name: &'static str,

    pub app_version: &'static str,
}

impl AppConfig {
    /// Defaults for `environment`.
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            api_base: environment.default_api_base().to_string(),
            api_version: "v1".into(),
            timeout: Duration::from_secs(30),
            offline: false,
            simulated_delay: Duration::from_millis(1000),
            app_name: env!("CARGO_PKG_NAME"),
            app_version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Populate config from environment variables, applying defaults where absent.
    ///
    /// An unrecognised `ARMATURE_ENV` falls back to development.
    pub fn from_env() -> Self {
        let environment = std::env::var("ARMATURE_ENV")
            .ok()
            .and_then(|v| Environment::from_str(&v, true).ok())
            .unwrap_or_default();

        let mut config = Self::for_environment(environment);

        if let Ok(base) = std::env::var("ARMATURE_API_BASE") {
            config.api_base = base;
        }
        if let Ok(version) = std::env::var("ARMATURE_API_VERSION") {
            config.api_version = version;
        }
        if let Some(secs) = std::env::var("ARMATURE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        config.offline = std::env::var("ARMATURE_OFFLINE").is_ok();
        if let Some(ms) = std::env::var("ARMATURE_SIMULATED_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.simulated_delay = Duration::from_millis(ms);
        }

        config
    }

    /// A GET endpoint for `path` under the configured API version.
    pub fn endpoint(&self, path: &str) -> Endpoint {
        Endpoint::get(
            self.api_base.clone(),
            format!("{}/{}", self.api_version, path.trim_start_matches('/')),
        )
    }

    /// Default `tracing` directive when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.environment.logging_enabled() {
            "armature=debug,armature_net=debug,armature_app=debug,armature_demo=debug,info"
        } else {
            "off"
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}
