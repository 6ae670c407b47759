//! The runtime client: connection lifecycle, request issuance, and the
//! response demultiplexer.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use relaykit_frame::{Frame, FrameCodec, MessageType};
use relaykit_transport::{StreamReadHalf, StreamWriteHalf, TransportConfig};
use relaykit_wire::{ErrorClass, ExecuteRequest, ExecuteResponse};
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::pending::PendingTable;

/// Default per-call timeout: 60 seconds.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Default tenant applied when neither the config nor the call names one.
pub const DEFAULT_TENANT_ID: &str = "default";

/// Client-level configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Tenant applied to calls that don't override it. Never empty — an
    /// empty value falls back to [`DEFAULT_TENANT_ID`].
    pub tenant_id: String,
    /// Workspace applied to calls that don't override it.
    pub workspace_id: Option<String>,
    /// Deadline for calls that don't specify their own timeout.
    pub default_timeout: Duration,
    /// Where to find the runtime.
    pub transport: TransportConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            workspace_id: None,
            default_timeout: DEFAULT_CALL_TIMEOUT,
            transport: TransportConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults plus `RELAYKIT_*` environment overrides for the transport.
    pub fn from_env() -> Self {
        Self {
            transport: TransportConfig::from_env(),
            ..Self::default()
        }
    }
}

/// Lifecycle of the single connection owned by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Closed = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Disconnected,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            _ => ConnectionState::Closed,
        }
    }
}

/// One logical call to hand to the runtime.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Which connector executes the work (e.g. `"http"`).
    pub connector_name: String,
    /// The connector operation (e.g. `"request"`).
    pub operation: String,
    /// Opaque operation payload, meaningful only to the connector.
    pub payload: Bytes,
    /// Per-call timeout; the config default applies when unset.
    pub timeout: Option<Duration>,
    /// Per-call tenant override.
    pub tenant_id: Option<String>,
    /// Per-call workspace override.
    pub workspace_id: Option<String>,
    /// Trace correlation ID, omitted from the wire when unset.
    pub trace_id: Option<String>,
}

impl ExecuteOptions {
    pub fn new(
        connector_name: impl Into<String>,
        operation: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            connector_name: connector_name.into(),
            operation: operation.into(),
            payload: payload.into(),
            timeout: None,
            tenant_id: None,
            workspace_id: None,
            trace_id: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

struct ClientShared {
    config: ClientConfig,
    table: PendingTable,
    writer: Mutex<FramedWrite<StreamWriteHalf, FrameCodec>>,
    next_request_id: AtomicU64,
    state: AtomicU8,
    shutdown: CancellationToken,
}

impl Drop for ClientShared {
    fn drop(&mut self) {
        // Last handle gone: stop the read loop.
        self.shutdown.cancel();
    }
}

/// A client holding the single connection to the connector runtime.
///
/// Cheap to clone; all clones share the connection, the correlation table,
/// and the request-ID counter. Dropping the last clone stops the read loop;
/// call [`close`](Self::close) for an orderly shutdown that fails in-flight
/// calls promptly.
#[derive(Clone)]
pub struct RuntimeClient {
    shared: Arc<ClientShared>,
}

impl RuntimeClient {
    /// Connect to the runtime and spawn the response demultiplexer.
    ///
    /// The request-ID counter is seeded from the current time so IDs do not
    /// collide across process restarts reusing the same socket.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let stream = relaykit_transport::connect(&config.transport).await?;
        let transport = stream.transport_name();
        let (read_half, write_half) = stream.into_split();

        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or(1);

        let shared = Arc::new(ClientShared {
            config,
            table: PendingTable::new(),
            writer: Mutex::new(FramedWrite::new(write_half, FrameCodec)),
            next_request_id: AtomicU64::new(seed),
            state: AtomicU8::new(ConnectionState::Connected as u8),
            shutdown: CancellationToken::new(),
        });

        tokio::spawn(read_loop(
            Arc::downgrade(&shared),
            FramedRead::new(read_half, FrameCodec),
            shared.shutdown.clone(),
        ));

        info!(transport, "connected to runtime");
        Ok(Self { shared })
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.shared.state.load(Ordering::SeqCst))
    }

    /// Number of calls currently in flight.
    pub fn in_flight(&self) -> usize {
        self.shared.table.len()
    }

    /// Issue a logical call and await its correlated response.
    ///
    /// The caller suspends until exactly one of: the matching response
    /// arrives, the deadline elapses, or the connection fails. A
    /// non-`Success` class becomes [`ClientError::Runtime`].
    pub async fn execute(&self, options: ExecuteOptions) -> Result<ExecuteResponse> {
        if self.state() != ConnectionState::Connected {
            return Err(ClientError::Closed);
        }

        let request_id = self.shared.next_request_id.fetch_add(1, Ordering::Relaxed);
        let timeout = options.timeout.unwrap_or(self.shared.config.default_timeout);
        let request = build_request(&self.shared.config, options, request_id, timeout, now_ms());
        let encoded = request.encode();

        // Register before writing: a response can arrive the instant the
        // frame hits the wire.
        let mut rx = self.shared.table.register(request_id);

        {
            let mut writer = self.shared.writer.lock().await;
            if let Err(source) = writer
                .send(Frame::new(MessageType::ExecuteRequest, encoded))
                .await
            {
                self.shared.table.remove(request_id);
                return Err(ClientError::SendFailed { request_id, source });
            }
        }
        debug!(
            request_id,
            connector = %request.connector_name,
            operation = %request.operation,
            "request sent"
        );

        let response = match tokio::time::timeout(timeout, &mut rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(ClientError::ConnectionLost { request_id }),
            Err(_) => {
                if self.shared.table.remove(request_id) {
                    return Err(ClientError::Timeout {
                        request_id,
                        after: timeout,
                    });
                }
                // A resolve (or fail_all) won the race against the deadline;
                // whatever it decided is already on the channel.
                match rx.await {
                    Ok(response) => response,
                    Err(_) => return Err(ClientError::ConnectionLost { request_id }),
                }
            }
        };

        match response.error_class {
            ErrorClass::Success => Ok(response),
            class => Err(ClientError::Runtime {
                request_id,
                class,
                message: response.error_message.unwrap_or_default(),
            }),
        }
    }

    /// Close the connection.
    ///
    /// Idempotent. Every in-flight call completes through the same failure
    /// path as an unexpected disconnect. The client is unusable afterwards;
    /// reconnection is the caller's decision.
    pub async fn close(&self) {
        let previous = self
            .shared
            .state
            .swap(ConnectionState::Closed as u8, Ordering::SeqCst);
        if previous == ConnectionState::Closed as u8 {
            return;
        }

        self.shared.shutdown.cancel();

        let mut writer = self.shared.writer.lock().await;
        if let Err(err) = writer.close().await {
            debug!(error = %err, "write half shutdown failed");
        }
        drop(writer);

        let failed = self.shared.table.fail_all();
        if failed > 0 {
            debug!(count = failed, "failed pending requests on close");
        }
    }
}

impl std::fmt::Debug for RuntimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeClient")
            .field("state", &self.state())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

/// Pack a logical call into its wire envelope, applying config defaults.
///
/// The per-call tenant wins over the config tenant, but the envelope never
/// carries an empty tenant. Workspace and trace stay off the wire entirely
/// when unset. The deadline is absolute so the runtime can cancel
/// cooperatively upstream.
fn build_request(
    config: &ClientConfig,
    options: ExecuteOptions,
    request_id: u64,
    timeout: Duration,
    now_ms: u64,
) -> ExecuteRequest {
    let tenant_id = options
        .tenant_id
        .filter(|tenant| !tenant.is_empty())
        .unwrap_or_else(|| {
            if config.tenant_id.is_empty() {
                DEFAULT_TENANT_ID.to_string()
            } else {
                config.tenant_id.clone()
            }
        });

    ExecuteRequest {
        request_id,
        tenant_id,
        workspace_id: options.workspace_id.or_else(|| config.workspace_id.clone()),
        trace_id: options.trace_id,
        connector_name: options.connector_name,
        operation: options.operation,
        deadline_at_ms: now_ms.saturating_add(timeout.as_millis() as u64),
        payload: options.payload,
    }
}

/// The response demultiplexer: the one read loop per connection.
///
/// Holds only a weak reference to the client so dropped clients don't stay
/// alive through their own loop. On stream error, EOF, or cancellation it
/// fails all pending requests and marks the connection closed.
async fn read_loop(
    shared: Weak<ClientShared>,
    mut frames: FramedRead<StreamReadHalf, FrameCodec>,
    shutdown: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("read loop stopping (client closed)");
                break;
            }
            next = frames.next() => next,
        };

        let Some(shared) = shared.upgrade() else {
            debug!("read loop stopping (client dropped)");
            return;
        };

        match next {
            Some(Ok(frame)) => dispatch_frame(&shared, frame),
            Some(Err(err)) => {
                warn!(error = %err, "protocol error on runtime stream, aborting connection");
                break;
            }
            None => {
                debug!("runtime closed the connection");
                break;
            }
        }
    }

    if let Some(shared) = shared.upgrade() {
        shared
            .state
            .store(ConnectionState::Closed as u8, Ordering::SeqCst);
        let failed = shared.table.fail_all();
        if failed > 0 {
            debug!(count = failed, "failed pending requests on disconnect");
        }
    }
}

/// Route one decoded frame into the correlation table.
///
/// An undecodable response envelope is logged and dropped without failing
/// anything: its request ID is unrecoverable, so the affected caller cannot
/// be completed early and instead rides out its deadline to a timeout. The
/// alternative, aborting the connection, would fail every in-flight call for
/// one bad envelope.
fn dispatch_frame(shared: &ClientShared, frame: Frame) {
    match frame.kind() {
        Some(MessageType::ExecuteResponse) => match ExecuteResponse::decode(frame.payload) {
            Ok(response) => {
                let request_id = response.request_id;
                if !shared.table.resolve(request_id, response) {
                    // Late response for a call that already timed out or
                    // failed. Intentionally discarded, but kept observable
                    // for diagnosing slow-but-finite runtime latency.
                    debug!(request_id, "discarding response for unknown request id");
                }
            }
            Err(err) => {
                warn!(error = %err, "undecodable response envelope, dropping frame");
            }
        },
        other => {
            warn!(
                message_type = frame.message_type,
                kind = other.map(MessageType::name),
                "unexpected message type on wire"
            );
        }
    }
}
