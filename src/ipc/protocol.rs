//! IPC protocol message types
//!
//! Defines the request/response envelopes spoken by FGP daemons, the
//! catalogue of GitHub daemon methods, and typed views over their results.
//! Each envelope travels as one compact JSON object followed by `\n`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::common::{Error, Result};

/// Protocol version sent in every request
pub const PROTOCOL_VERSION: u8 = 1;

/// Byte that ends every frame on the wire
pub const FRAME_TERMINATOR: u8 = b'\n';

/// Message returned when a failed response carries no error text
const UNKNOWN_ERROR: &str = "unknown error";

/// String-keyed parameter or result object
pub type Params = Map<String, Value>;

/// IPC request from client to daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Correlation id, fresh for every call
    pub id: String,
    /// Protocol version
    pub v: u8,
    /// Daemon method, e.g. `github.repos`
    pub method: String,
    /// Method parameters, `{}` when there are none
    #[serde(default)]
    pub params: Params,
}

impl Request {
    /// Create a request with a newly generated id
    pub fn new(method: impl Into<String>, params: Params) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            v: PROTOCOL_VERSION,
            method: method.into(),
            params,
        }
    }

    /// Serialize to a single newline-terminated frame
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_frame(self)
    }

    /// Parse a frame, with or without its terminator
    pub fn decode(frame: &[u8]) -> Result<Self> {
        decode_frame(frame)
    }
}

/// IPC response from daemon to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Whether the daemon completed the method
    pub ok: bool,
    /// Result data on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Params>,
    /// Error message on failure
    #[serde(
        default,
        deserialize_with = "deserialize_error",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Option<String>,
    /// Request id, when the daemon echoes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Response {
    /// Create a success response
    pub fn success(result: Params) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
            id: None,
        }
    }

    /// Create a failure response
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(message.into()),
            id: None,
        }
    }

    /// Attach the request id this response answers
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Serialize to a single newline-terminated frame
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_frame(self)
    }

    /// Parse a frame, with or without its terminator
    pub fn decode(frame: &[u8]) -> Result<Self> {
        decode_frame(frame)
    }

    /// Split into the application-level outcome
    ///
    /// `result` is only looked at when `ok` is true and `error` only when it
    /// is false, whatever else the daemon put in the envelope.
    pub fn into_result(self) -> std::result::Result<Params, DaemonError> {
        if self.ok {
            Ok(self.result.unwrap_or_default())
        } else {
            Err(DaemonError::new(
                self.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            ))
        }
    }
}

/// Error field as sent by daemons: a bare string, or an object such as
/// `{"code": "NOT_FOUND", "message": "repo not found"}`
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Message(String),
    Detailed {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        code: Option<String>,
    },
}

fn deserialize_error<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<ErrorField>::deserialize(deserializer)?;
    Ok(field.and_then(|field| match field {
        ErrorField::Message(message) => Some(message),
        ErrorField::Detailed { message, code } => message.or(code),
    }))
}

fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    let mut frame = serde_json::to_vec(message)?;
    if frame.contains(&FRAME_TERMINATOR) {
        return Err(Error::InvalidRequest(
            "encoded message contains a raw newline".to_string(),
        ));
    }
    frame.push(FRAME_TERMINATOR);
    Ok(frame)
}

fn decode_frame<T: DeserializeOwned>(frame: &[u8]) -> Result<T> {
    let payload = match frame.iter().position(|&b| b == FRAME_TERMINATOR) {
        Some(end) => &frame[..end],
        None => frame,
    };
    serde_json::from_slice(payload).map_err(Error::decode)
}

/// Application-level failure reported by the daemon (`ok: false`)
///
/// This is data, not a transport problem: the daemon was reachable and
/// answered, but the operation itself failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonError {
    pub message: String,
}

impl DaemonError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for DaemonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DaemonError {}

/// Outcome of a call that reached the daemon
pub type Reply<T> = std::result::Result<T, DaemonError>;

/// Issue / pull request state filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum State {
    #[default]
    Open,
    Closed,
    All,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        };
        f.write_str(s)
    }
}

impl FromStr for State {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "all" => Ok(Self::All),
            other => Err(format!(
                "invalid state '{}', expected open, closed or all",
                other
            )),
        }
    }
}

// === Method parameters ===

/// Parameters for `github.repos`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReposParams {
    /// List this user's repositories instead of your own
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Parameters for `github.issues` and `github.prs`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListParams {
    /// Repository in `owner/repo` form
    pub repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ListParams {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            state: None,
            limit: None,
        }
    }
}

/// Parameters for `github.pr`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrParams {
    pub repo: String,
    pub number: u64,
}

/// Parameters for `github.notifications`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Parameters for `github.create_issue`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateIssueParams {
    pub repo: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Methods the GitHub daemon understands
///
/// `Raw` passes any other method through with an untyped parameter map.
#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    /// Liveness check, empty parameters
    Health,
    /// Current authenticated user
    User,
    Repos(ReposParams),
    Issues(ListParams),
    Prs(ListParams),
    Pr(PrParams),
    Notifications(NotificationsParams),
    CreateIssue(CreateIssueParams),
    Raw { method: String, params: Params },
}

impl Method {
    /// Wire name of the method
    pub fn name(&self) -> &str {
        match self {
            Self::Health => "health",
            Self::User => "github.user",
            Self::Repos(_) => "github.repos",
            Self::Issues(_) => "github.issues",
            Self::Prs(_) => "github.prs",
            Self::Pr(_) => "github.pr",
            Self::Notifications(_) => "github.notifications",
            Self::CreateIssue(_) => "github.create_issue",
            Self::Raw { method, .. } => method.as_str(),
        }
    }

    /// Parameter object sent with the method
    pub fn params(&self) -> Result<Params> {
        match self {
            Self::Health | Self::User => Ok(Params::new()),
            Self::Repos(p) => to_params(p),
            Self::Issues(p) | Self::Prs(p) => to_params(p),
            Self::Pr(p) => to_params(p),
            Self::Notifications(p) => to_params(p),
            Self::CreateIssue(p) => to_params(p),
            Self::Raw { params, .. } => Ok(params.clone()),
        }
    }
}

fn to_params<T: Serialize>(params: &T) -> Result<Params> {
    match serde_json::to_value(params)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidRequest(format!(
            "parameters must encode to an object, got {}",
            other
        ))),
    }
}

/// Parse a JSON object given on the command line into parameters
pub fn parse_params(text: &str) -> Result<Params> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::InvalidRequest(
            "parameters must be a JSON object".to_string(),
        )),
    }
}

/// Decode a result object into a typed view
pub fn decode_result<T: DeserializeOwned>(result: Params) -> Result<T> {
    serde_json::from_value(Value::Object(result)).map_err(Error::decode)
}

// === Result types for responses ===

/// `health` result
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthResult {
    pub status: Option<String>,
    pub api_connected: Option<bool>,
    pub version: Option<String>,
}

/// A GitHub account reference
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub login: String,
}

/// `github.user` result
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub public_repos: Option<u64>,
    pub followers: Option<u64>,
    pub following: Option<u64>,
}

/// Repository summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Repo {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: u64,
}

/// `github.repos` result
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReposResult {
    pub repos: Vec<Repo>,
    pub count: usize,
}

/// Issue label
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Label {
    pub name: String,
}

/// Issue summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub url: Option<String>,
    pub created_at: Option<String>,
    pub author: Option<String>,
    pub user: Option<Account>,
    pub labels: Vec<Label>,
}

impl Issue {
    /// Author login, from whichever field the daemon filled in
    pub fn author_login(&self) -> Option<&str> {
        self.author
            .as_deref()
            .or_else(|| self.user.as_ref().map(|u| u.login.as_str()))
    }
}

/// `github.issues` result
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuesResult {
    pub repo: String,
    pub state: String,
    pub issues: Vec<Issue>,
    pub count: usize,
}

/// Pull request summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub head_ref: Option<String>,
    pub base_ref: Option<String>,
    pub url: Option<String>,
    pub author: Option<String>,
    pub user: Option<Account>,
}

impl PullRequest {
    pub fn author_login(&self) -> Option<&str> {
        self.author
            .as_deref()
            .or_else(|| self.user.as_ref().map(|u| u.login.as_str()))
    }
}

/// `github.prs` result
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PullsResult {
    pub repo: String,
    pub state: String,
    pub prs: Vec<PullRequest>,
    pub count: usize,
}

/// Pull request review
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Review {
    pub author: String,
    pub state: String,
}

/// Commit status check
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusCheck {
    pub context: String,
    pub state: String,
}

/// `github.pr` result
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PullDetails {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub mergeable: Option<bool>,
    pub head_ref: Option<String>,
    pub base_ref: Option<String>,
    pub reviews: Vec<Review>,
    pub status_checks: Vec<StatusCheck>,
}

/// Notification entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    pub id: String,
    pub reason: String,
    pub unread: bool,
    pub subject_title: Option<String>,
    pub subject_type: Option<String>,
    pub repo_full_name: Option<String>,
}

/// `github.notifications` result
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsResult {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

/// Reference to a newly created issue
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueRef {
    pub number: u64,
    pub title: String,
    pub url: Option<String>,
}

/// `github.create_issue` result
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatedIssue {
    pub created: bool,
    pub issue: Option<IssueRef>,
}
