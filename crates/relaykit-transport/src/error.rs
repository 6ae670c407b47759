use std::path::PathBuf;

/// Errors that can occur while establishing or using the runtime connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the Unix domain socket.
    #[error("failed to connect to socket {}: {source}", .path.display())]
    SocketConnect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to the TCP fallback address.
    #[error("failed to connect to {addr}: {source}")]
    TcpConnect {
        addr: String,
        source: std::io::Error,
    },

    /// Neither the socket path nor the TCP fallback accepted the connection.
    #[error("runtime unreachable (socket {socket_error}; tcp {tcp_error})")]
    Unreachable {
        socket_error: String,
        tcp_error: String,
    },

    /// The connection attempt did not complete within the configured timeout.
    #[error("connection to {target} timed out after {timeout:?}")]
    ConnectTimeout {
        target: String,
        timeout: std::time::Duration,
    },

    /// An I/O error occurred on the established stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
