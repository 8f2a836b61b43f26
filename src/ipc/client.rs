//! IPC client for communicating with an FGP daemon
//!
//! Every call opens its own connection, writes one request frame, reads one
//! response frame, and drops the connection. Nothing is retried.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::Instrument;

use crate::common::config::Config;
use crate::common::{Error, Result};

use super::protocol::{
    decode_result, CreateIssueParams, CreatedIssue, HealthResult, IssuesResult, ListParams,
    Method, NotificationsParams, NotificationsResult, Params, PrParams, PullDetails, PullsResult,
    Reply, ReposParams, ReposResult, Request, Response, UserInfo,
};
use super::transport;

/// Stage of a single call, reported when its deadline expires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Connecting,
    Sending,
    Receiving,
    Parsing,
}

impl fmt::Display for CallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Sending => "sending",
            Self::Receiving => "receiving",
            Self::Parsing => "parsing",
        };
        f.write_str(s)
    }
}

/// Immutable settings for a [`DaemonClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Path to the daemon's socket
    pub socket_path: PathBuf,
    /// Bound on establishing the connection
    pub connect_timeout: Duration,
    /// Bound on writing the request and reading the whole response
    pub read_timeout: Duration,
    /// Fail instead of warn when the daemon echoes a different id
    pub strict_correlation: bool,
}

impl ClientConfig {
    /// Create settings for a socket with default timeouts
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
            strict_correlation: false,
        }
    }

    /// Build settings from a loaded configuration file
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            socket_path: config.socket_path()?,
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
            strict_correlation: config.protocol.strict_correlation,
        })
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_strict_correlation(mut self, strict: bool) -> Self {
        self.strict_correlation = strict;
        self
    }
}

/// Client for communicating with an FGP daemon
#[derive(Debug, Clone)]
pub struct DaemonClient {
    config: ClientConfig,
}

impl DaemonClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Create a client from the configuration file
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(ClientConfig::from_config(config)?))
    }

    /// Socket this client connects to
    pub fn socket_path(&self) -> &Path {
        &self.config.socket_path
    }

    /// Perform one request/response exchange
    ///
    /// The outer `Result` is the transport outcome. An `ok: false` answer is
    /// still `Ok(response)`; inspect it with [`Response::into_result`].
    pub async fn invoke(&self, method: &str, params: Params) -> Result<Response> {
        if method.is_empty() {
            return Err(Error::InvalidRequest("method name is empty".to_string()));
        }

        let request = Request::new(method, params);
        let span = tracing::debug_span!("invoke", method = %request.method, id = %request.id);
        self.exchange(&request).instrument(span).await
    }

    async fn exchange(&self, request: &Request) -> Result<Response> {
        let frame = request.encode()?;
        let path = &self.config.socket_path;

        tracing::trace!(phase = %CallPhase::Connecting, path = %path.display());
        let mut stream = timeout(self.config.connect_timeout, transport::connect(path))
            .await
            .map_err(|_| {
                self.timed_out(CallPhase::Connecting, self.config.connect_timeout)
            })?
            .map_err(|e| Error::from_connect(e, path.clone()))?;

        let deadline = Instant::now() + self.config.read_timeout;

        tracing::trace!(phase = %CallPhase::Sending, bytes = frame.len());
        timeout_at(deadline, transport::send_frame(&mut stream, &frame))
            .await
            .map_err(|_| self.timed_out(CallPhase::Sending, self.config.read_timeout))?
            .map_err(Error::DaemonCommunication)?;

        tracing::trace!(phase = %CallPhase::Receiving);
        let payload = timeout_at(deadline, transport::recv_frame(&mut stream))
            .await
            .map_err(|_| self.timed_out(CallPhase::Receiving, self.config.read_timeout))??;

        drop(stream);
        tracing::trace!(phase = %CallPhase::Parsing, bytes = payload.len());

        let response = Response::decode(&payload)?;
        self.check_correlation(request, &response)?;

        tracing::debug!(ok = response.ok, "call complete");
        Ok(response)
    }

    fn timed_out(&self, phase: CallPhase, limit: Duration) -> Error {
        tracing::warn!(%phase, ?limit, "daemon call timed out");
        Error::Timeout { phase, limit }
    }

    fn check_correlation(&self, request: &Request, response: &Response) -> Result<()> {
        let Some(echoed) = response.id.as_deref() else {
            return Ok(());
        };
        if echoed == request.id {
            return Ok(());
        }
        if self.config.strict_correlation {
            return Err(Error::CorrelationMismatch {
                expected: request.id.clone(),
                actual: echoed.to_string(),
            });
        }
        tracing::warn!(expected = %request.id, actual = echoed, "response id mismatch");
        Ok(())
    }

    /// Call a catalogued method
    pub async fn call(&self, method: &Method) -> Result<Response> {
        self.invoke(method.name(), method.params()?).await
    }

    /// Call a method and decode a successful result into `T`
    pub async fn call_typed<T: DeserializeOwned>(&self, method: &Method) -> Result<Reply<T>> {
        match self.call(method).await?.into_result() {
            Ok(result) => Ok(Ok(decode_result(result)?)),
            Err(e) => Ok(Err(e)),
        }
    }

    /// Liveness check
    pub async fn health(&self) -> Result<Reply<HealthResult>> {
        self.call_typed(&Method::Health).await
    }

    /// Check if the daemon is up and answering
    ///
    /// A daemon that is not running is `Ok(false)`; other transport failures
    /// are returned as errors.
    pub async fn ping(&self) -> Result<bool> {
        match self.health().await {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "health check answered with failure");
                Ok(false)
            }
            Err(Error::DaemonNotRunning { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn user(&self) -> Result<Reply<UserInfo>> {
        self.call_typed(&Method::User).await
    }

    pub async fn repos(&self, params: ReposParams) -> Result<Reply<ReposResult>> {
        self.call_typed(&Method::Repos(params)).await
    }

    pub async fn issues(&self, params: ListParams) -> Result<Reply<IssuesResult>> {
        self.call_typed(&Method::Issues(params)).await
    }

    pub async fn prs(&self, params: ListParams) -> Result<Reply<PullsResult>> {
        self.call_typed(&Method::Prs(params)).await
    }

    pub async fn pr(&self, repo: impl Into<String>, number: u64) -> Result<Reply<PullDetails>> {
        self.call_typed(&Method::Pr(PrParams {
            repo: repo.into(),
            number,
        }))
        .await
    }

    pub async fn notifications(&self, limit: Option<u32>) -> Result<Reply<NotificationsResult>> {
        self.call_typed(&Method::Notifications(NotificationsParams { limit }))
            .await
    }

    pub async fn create_issue(&self, params: CreateIssueParams) -> Result<Reply<CreatedIssue>> {
        self.call_typed(&Method::CreateIssue(params)).await
    }
}
