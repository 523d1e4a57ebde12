use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::time::Duration;

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The host interface every listener binds to
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The TCP port of the admin HTTP surface
    #[arg(long, env, default_value_t = 4000)]
    pub http_port: u16,

    /// The TCP port of the progress sync service
    #[arg(long, env, default_value_t = 9090)]
    pub tcp_port: u16,

    /// The UDP port of the chapter notification service
    #[arg(long, env, default_value_t = 9091)]
    pub udp_port: u16,

    /// The TCP port of the chat WebSocket endpoint
    #[arg(long, env, default_value_t = 9093)]
    pub websocket_port: u16,

    /// HMAC secret used to validate bearer tokens issued by the API.
    #[arg(long, env, hide_env_values = true)]
    jwt_secret: Option<String>,

    /// User ids allowed to inject chapter notifications through the admin surface.
    #[arg(long, env, value_delimiter = ',', use_value_delimiter = true)]
    pub admin_user_ids: Vec<String>,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap_or(LevelFilter::Info)),
        )]
    pub log_level_filter: LevelFilter,

    /// Seconds a progress sync connection has to present its credentials
    #[arg(long, env, default_value_t = 30)]
    pub auth_timeout_secs: u64,

    /// Upper bound in seconds on a single socket write before the session is dropped
    #[arg(long, env, default_value_t = 10)]
    pub write_timeout_secs: u64,

    /// Outbound frames buffered per progress sync session
    #[arg(long, env, default_value_t = 64)]
    pub session_queue_capacity: usize,

    /// Progress events buffered ahead of the progress sync fan-out
    #[arg(long, env, default_value_t = 100)]
    pub progress_ingress_capacity: usize,

    /// Notifications buffered ahead of the UDP fan-out
    #[arg(long, env, default_value_t = 100)]
    pub notification_ingress_capacity: usize,

    /// Seconds without traffic after which a UDP registrant is dropped
    #[arg(long, env, default_value_t = 300)]
    pub stale_threshold_secs: u64,

    /// Seconds between two reaper sweeps
    #[arg(long, env, default_value_t = 60)]
    pub reap_interval_secs: u64,

    /// Largest datagram accepted by the notification service
    #[arg(long, env, default_value_t = 2048)]
    pub udp_buffer_size: usize,

    /// Outbound frames buffered per chat member
    #[arg(long, env, default_value_t = 256)]
    pub chat_queue_capacity: usize,

    /// Room a chat member lands in when none is requested
    #[arg(long, env, default_value = "general")]
    pub chat_default_room: String,

    /// Commands buffered ahead of the chat hub
    #[arg(long, env, default_value_t = 256)]
    pub chat_ingress_capacity: usize,

    /// Capacity of each event bridge channel
    #[arg(long, env, default_value_t = 100)]
    pub bridge_capacity: usize,

    /// Seconds the process waits for services to stop before exiting anyway
    #[arg(long, env, default_value_t = 5)]
    pub shutdown_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn set_jwt_secret(mut self, jwt_secret: String) -> Self {
        self.jwt_secret = Some(jwt_secret);
        self
    }

    /// Returns the token secret, or `None` when it was left unset or blank.
    pub fn jwt_secret(&self) -> Option<&str> {
        self.jwt_secret
            .as_deref()
            .map(str::trim)
            .filter(|secret| !secret.is_empty())
    }

    pub fn interface(&self) -> &str {
        self.interface.as_deref().unwrap_or("127.0.0.1")
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn stale_threshold(&self) -> Duration {
        Duration::from_secs(self.stale_threshold_secs)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
