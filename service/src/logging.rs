use crate::config::Config;
use log::{LevelFilter, SetLoggerError};
use simplelog::{ConfigBuilder, TermLogger};

/// Transport and framework crates that log per frame or per connection.
const NOISY_DEPENDENCIES: &[&str] = &["tokio_util", "tower", "hyper", "axum", "tungstenite"];

pub struct Logger {}

impl Logger {
    /// Installs a terminal logger at the configured level. Every line carries
    /// its target so output from the four buses can be told apart.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        let level = config.log_level_filter;
        TermLogger::init(
            level,
            Self::log_config(Self::silenced_modules(level)),
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        )
    }

    /// Dependencies stay quiet unless tracing.
    fn silenced_modules(level: LevelFilter) -> &'static [&'static str] {
        if level == LevelFilter::Trace {
            &[]
        } else {
            NOISY_DEPENDENCIES
        }
    }

    fn log_config(silenced: &[&'static str]) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder
            .set_time_format_rfc3339()
            .set_target_level(LevelFilter::Trace);
        for module in silenced {
            builder.add_filter_ignore_str(module);
        }
        builder.build()
    }
}
