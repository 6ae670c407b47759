use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the Unix socket path.
pub const ENV_SOCKET_PATH: &str = "RELAYKIT_SOCKET_PATH";
/// Environment variable overriding the TCP host.
pub const ENV_TCP_HOST: &str = "RELAYKIT_TCP_HOST";
/// Environment variable overriding the TCP port.
pub const ENV_TCP_PORT: &str = "RELAYKIT_TCP_PORT";
/// Environment variable forcing TCP even where Unix sockets are available.
pub const ENV_FORCE_TCP: &str = "RELAYKIT_FORCE_TCP";

/// Default socket file name under the system temp directory.
const DEFAULT_SOCKET_FILE: &str = "relaykit-runtime.sock";
/// Default TCP fallback port.
const DEFAULT_TCP_PORT: u16 = 5000;
/// Default connection establishment timeout, matching the default per-call
/// timeout of the client layer.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where and how to reach the connector runtime.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Unix domain socket path. Preferred on Unix platforms.
    pub socket_path: PathBuf,
    /// TCP fallback host.
    pub tcp_host: String,
    /// TCP fallback port.
    pub tcp_port: u16,
    /// Skip the Unix socket attempt entirely and connect over TCP.
    pub force_tcp: bool,
    /// How long a single connection attempt may take.
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            socket_path: std::env::temp_dir().join(DEFAULT_SOCKET_FILE),
            tcp_host: "127.0.0.1".to_string(),
            tcp_port: DEFAULT_TCP_PORT,
            force_tcp: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Build a config from defaults plus `RELAYKIT_*` environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var(ENV_SOCKET_PATH) {
            if !path.is_empty() {
                config.socket_path = PathBuf::from(path);
            }
        }
        if let Ok(host) = std::env::var(ENV_TCP_HOST) {
            if !host.is_empty() {
                config.tcp_host = host;
            }
        }
        if let Ok(port) = std::env::var(ENV_TCP_PORT) {
            match port.parse::<u16>() {
                Ok(parsed) => config.tcp_port = parsed,
                Err(_) => tracing::warn!(value = %port, "ignoring unparseable {}", ENV_TCP_PORT),
            }
        }
        if let Ok(force) = std::env::var(ENV_FORCE_TCP) {
            config.force_tcp = matches!(force.as_str(), "1" | "true" | "TRUE" | "True");
        }

        config
    }

    /// The TCP fallback address in `host:port` form.
    pub fn tcp_addr(&self) -> String {
        format!("{}:{}", self.tcp_host, self.tcp_port)
    }
}
