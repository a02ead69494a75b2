//! Command-line interface for the Keel service host.

use camino::Utf8PathBuf;
use clap::Parser;
use keel_config::{
    ConfigError, DEFAULT_LOG_FILTER, LogFormat, Properties, default_log_format, parse_assignment,
};

/// Hosts the services declared in Keel property files.
#[derive(Parser, Debug, Clone)]
#[command(name = "keeld", version, about)]
pub struct Cli {
    /// Property file to load. Repeatable; later files override earlier ones.
    #[arg(
        long = "config",
        value_name = "PATH",
        env = "KEEL_CONFIG",
        value_delimiter = ','
    )]
    pub config: Vec<Utf8PathBuf>,
    /// Property override applied after every file. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub overrides: Vec<(String, String)>,
    /// Tracing filter expression.
    #[arg(long, env = "KEEL_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
    /// Log output format: `json` or `compact`.
    #[arg(long, env = "KEEL_LOG_FORMAT", default_value_t = default_log_format())]
    pub log_format: LogFormat,
    /// Arguments routed to services, for example `--Hello.greeting=hi`.
    #[arg(
        value_name = "ARG",
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

impl Cli {
    /// Loads every property file in order, then applies the overrides.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] raised by a property file.
    pub fn load_properties(&self) -> Result<Properties, ConfigError> {
        let mut properties = Properties::new();
        for path in &self.config {
            properties.load_file(path)?;
        }
        for (key, value) in &self.overrides {
            properties.set(key.as_str(), value.as_str());
        }
        Ok(properties)
    }
}
