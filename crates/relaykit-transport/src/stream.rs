use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;
use tracing::{debug, info};

use crate::config::TransportConfig;
use crate::error::{Result, TransportError};

/// A connected duplex stream to the runtime.
///
/// On Unix this is preferably a Unix domain socket; TCP is used as a fallback
/// or when forced via [`TransportConfig::force_tcp`]. The choice is made once
/// at connect time.
pub enum RuntimeStream {
    #[cfg(unix)]
    Unix(UnixStream),
    Tcp(TcpStream),
}

impl RuntimeStream {
    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match self {
            #[cfg(unix)]
            RuntimeStream::Unix(_) => "unix-domain-socket",
            RuntimeStream::Tcp(_) => "tcp",
        }
    }

    /// Split into independently owned read and write halves.
    pub fn into_split(self) -> (StreamReadHalf, StreamWriteHalf) {
        match self {
            #[cfg(unix)]
            RuntimeStream::Unix(stream) => {
                let (read, write) = stream.into_split();
                (StreamReadHalf::Unix(read), StreamWriteHalf::Unix(write))
            }
            RuntimeStream::Tcp(stream) => {
                let (read, write) = stream.into_split();
                (StreamReadHalf::Tcp(read), StreamWriteHalf::Tcp(write))
            }
        }
    }
}

impl std::fmt::Debug for RuntimeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeStream")
            .field("type", &self.transport_name())
            .finish()
    }
}

/// Connect to the runtime according to `config`.
///
/// Attempts the Unix domain socket first (on Unix, unless TCP is forced) and
/// falls back to TCP. Each attempt is bounded by `config.connect_timeout`.
/// When both paths fail the returned error carries both causes.
pub async fn connect(config: &TransportConfig) -> Result<RuntimeStream> {
    if config.force_tcp {
        return connect_tcp(config).await;
    }

    #[cfg(unix)]
    {
        match connect_unix(config).await {
            Ok(stream) => return Ok(stream),
            Err(socket_error) => {
                debug!(%socket_error, "unix socket connect failed, falling back to tcp");
                return connect_tcp(config).await.map_err(|tcp_error| {
                    TransportError::Unreachable {
                        socket_error: socket_error.to_string(),
                        tcp_error: tcp_error.to_string(),
                    }
                });
            }
        }
    }

    #[cfg(not(unix))]
    connect_tcp(config).await
}

#[cfg(unix)]
async fn connect_unix(config: &TransportConfig) -> Result<RuntimeStream> {
    let path = &config.socket_path;
    let attempt = UnixStream::connect(path);
    let stream = tokio::time::timeout(config.connect_timeout, attempt)
        .await
        .map_err(|_| TransportError::ConnectTimeout {
            target: path.display().to_string(),
            timeout: config.connect_timeout,
        })?
        .map_err(|source| TransportError::SocketConnect {
            path: path.clone(),
            source,
        })?;

    info!(path = %path.display(), "connected via unix domain socket");
    Ok(RuntimeStream::Unix(stream))
}

async fn connect_tcp(config: &TransportConfig) -> Result<RuntimeStream> {
    let addr = config.tcp_addr();
    let attempt = TcpStream::connect(&addr);
    let stream = tokio::time::timeout(config.connect_timeout, attempt)
        .await
        .map_err(|_| TransportError::ConnectTimeout {
            target: addr.clone(),
            timeout: config.connect_timeout,
        })?
        .map_err(|source| TransportError::TcpConnect {
            addr: addr.clone(),
            source,
        })?;

    info!(%addr, "connected via tcp");
    Ok(RuntimeStream::Tcp(stream))
}

/// Owned read half of a [`RuntimeStream`].
pub enum StreamReadHalf {
    #[cfg(unix)]
    Unix(tokio::net::unix::OwnedReadHalf),
    Tcp(tokio::net::tcp::OwnedReadHalf),
}

/// Owned write half of a [`RuntimeStream`].
pub enum StreamWriteHalf {
    #[cfg(unix)]
    Unix(tokio::net::unix::OwnedWriteHalf),
    Tcp(tokio::net::tcp::OwnedWriteHalf),
}

impl AsyncRead for StreamReadHalf {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            #[cfg(unix)]
            StreamReadHalf::Unix(half) => Pin::new(half).poll_read(cx, buf),
            StreamReadHalf::Tcp(half) => Pin::new(half).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for StreamWriteHalf {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            #[cfg(unix)]
            StreamWriteHalf::Unix(half) => Pin::new(half).poll_write(cx, buf),
            StreamWriteHalf::Tcp(half) => Pin::new(half).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            #[cfg(unix)]
            StreamWriteHalf::Unix(half) => Pin::new(half).poll_flush(cx),
            StreamWriteHalf::Tcp(half) => Pin::new(half).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            #[cfg(unix)]
            StreamWriteHalf::Unix(half) => Pin::new(half).poll_shutdown(cx),
            StreamWriteHalf::Tcp(half) => Pin::new(half).poll_shutdown(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    fn test_config() -> TransportConfig {
        TransportConfig {
            socket_path: std::env::temp_dir().join(format!(
                "relaykit-transport-test-{}-{}.sock",
                std::process::id(),
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .expect("time should be after epoch")
                    .as_nanos()
            )),
            ..TransportConfig::default()
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn connects_via_unix_socket() {
        let config = test_config();
        let listener = tokio::net::UnixListener::bind(&config.socket_path).unwrap();

        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });
        let stream = connect(&config).await.unwrap();
        assert_eq!(stream.transport_name(), "unix-domain-socket");
        accept.await.unwrap();

        let _ = std::fs::remove_file(&config.socket_path);
    }

    #[tokio::test]
    async fn falls_back_to_tcp_when_socket_missing() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let config = TransportConfig {
            tcp_port: port,
            ..test_config()
        };

        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });
        let stream = connect(&config).await.unwrap();
        assert_eq!(stream.transport_name(), "tcp");
        accept.await.unwrap();
    }

    #[tokio::test]
    async fn force_tcp_skips_socket() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // Socket path exists and is live, but force_tcp must ignore it.
        let config = test_config();
        #[cfg(unix)]
        let _uds = tokio::net::UnixListener::bind(&config.socket_path).unwrap();
        let config = TransportConfig {
            tcp_port: port,
            force_tcp: true,
            ..config
        };

        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });
        let stream = connect(&config).await.unwrap();
        assert_eq!(stream.transport_name(), "tcp");
        accept.await.unwrap();

        #[cfg(unix)]
        let _ = std::fs::remove_file(&config.socket_path);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn both_paths_failing_is_distinguishable() {
        // Nothing listens on the socket path, and nothing listens on the
        // reserved port either.
        let config = TransportConfig {
            tcp_port: 1,
            ..test_config()
        };

        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, TransportError::Unreachable { .. }));
    }

    #[tokio::test]
    async fn split_halves_carry_bytes() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let config = TransportConfig {
            tcp_port: port,
            force_tcp: true,
            ..test_config()
        };

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).await.unwrap();
            stream.write_all(&buf).await.unwrap();
        });

        let stream = connect(&config).await.unwrap();
        let (mut read, mut write) = stream.into_split();
        write.write_all(b"ping").await.unwrap();

        let mut buf = [0u8; 4];
        read.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        server.await.unwrap();
    }
}
