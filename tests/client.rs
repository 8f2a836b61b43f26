//! Integration tests for the daemon client
//!
//! Each test starts a mock daemon on a Unix socket inside a temporary
//! directory and drives the real client against it.

#![cfg(unix)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fgp_github::ipc::client::CallPhase;
use fgp_github::ipc::protocol::{CreateIssueParams, ListParams, Params, ReposParams, State};
use fgp_github::{ClientConfig, DaemonClient, Error, Method, Response};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

/// What the mock daemon does after reading a request
enum Action {
    /// Write these bytes, then close
    Send(Vec<u8>),
    /// Never answer and keep the connection open
    Hang,
}

fn reply(response: Response) -> Action {
    Action::Send(response.encode().unwrap())
}

fn success(result: Value) -> Action {
    match result {
        Value::Object(map) => reply(Response::success(map)),
        _ => panic!("Expected object"),
    }
}

fn failure(message: &str) -> Action {
    reply(Response::failure(message))
}

/// A fake daemon recording every request it sees
struct MockDaemon {
    _dir: TempDir,
    path: PathBuf,
    requests: Arc<Mutex<Vec<Value>>>,
    connections: Arc<AtomicUsize>,
    /// Bytes each connection sent after its first frame
    trailing: Arc<Mutex<Vec<usize>>>,
}

impl MockDaemon {
    fn spawn<F>(handler: F) -> Self
    where
        F: Fn(&Value) -> Action + Send + Sync + 'static,
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let trailing = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(handler);

        {
            let requests = requests.clone();
            let connections = connections.clone();
            let trailing = trailing.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    connections.fetch_add(1, Ordering::SeqCst);
                    let handler = handler.clone();
                    let requests = requests.clone();
                    let trailing = trailing.clone();

                    tokio::spawn(async move {
                        let (reader, mut writer) = stream.into_split();
                        let mut reader = BufReader::new(reader);
                        let mut line = String::new();
                        if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                            return;
                        }

                        let request: Value = serde_json::from_str(line.trim_end()).unwrap();
                        let action = handler(&request);
                        requests.lock().unwrap().push(request);

                        match action {
                            Action::Send(bytes) => {
                                let _ = writer.write_all(&bytes).await;
                                let _ = writer.shutdown().await;
                                let mut rest = Vec::new();
                                let _ = reader.read_to_end(&mut rest).await;
                                trailing.lock().unwrap().push(rest.len());
                            }
                            Action::Hang => {
                                tokio::time::sleep(Duration::from_secs(60)).await;
                            }
                        }
                    });
                }
            });
        }

        Self {
            _dir: dir,
            path,
            requests,
            connections,
            trailing,
        }
    }

    fn client(&self) -> DaemonClient {
        DaemonClient::new(self.config())
    }

    fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.path).with_read_timeout(Duration::from_secs(5))
    }

    fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn test_empty_repo_list_is_not_an_error() {
    let daemon = MockDaemon::spawn(|_| success(json!({"repos": []})));

    let repos = daemon
        .client()
        .repos(ReposParams {
            user: Some("octocat".into()),
            limit: Some(5),
        })
        .await
        .expect("transport should succeed")
        .expect("daemon reported success");

    assert!(repos.repos.is_empty());

    let requests = daemon.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["method"], "github.repos");
    assert_eq!(requests[0]["v"], 1);
    assert_eq!(requests[0]["params"], json!({"user": "octocat", "limit": 5}));
    assert!(requests[0]["id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn test_application_failure_is_data() {
    let daemon = MockDaemon::spawn(|_| failure("rate limited"));

    let reply = daemon
        .client()
        .issues(ListParams::new("fast-gateway-protocol/browser"))
        .await
        .expect("transport should succeed");

    let err = reply.expect_err("daemon reported failure");
    assert_eq!(err.message, "rate limited");
}

#[tokio::test]
async fn test_structured_error_is_still_data() {
    let daemon = MockDaemon::spawn(|_| {
        let mut frame =
            br#"{"ok":false,"error":{"code":"NOT_FOUND","message":"repo not found"}}"#.to_vec();
        frame.push(b'\n');
        Action::Send(frame)
    });

    let reply = daemon
        .client()
        .pr("a/missing", 1)
        .await
        .expect("transport should succeed");
    assert_eq!(reply.unwrap_err().message, "repo not found");
}

#[tokio::test]
async fn test_raw_failure_response_has_no_result() {
    let daemon = MockDaemon::spawn(|_| failure("rate limited"));

    let response = daemon
        .client()
        .invoke("github.repos", Params::new())
        .await
        .unwrap();
    assert!(!response.ok);
    assert!(response.result.is_none());
    assert_eq!(response.error.as_deref(), Some("rate limited"));
}

#[tokio::test]
async fn test_missing_socket_is_transport_error() {
    let dir = tempfile::tempdir().unwrap();
    let client = DaemonClient::new(ClientConfig::new(dir.path().join("daemon.sock")));

    let err = client.invoke("health", Params::new()).await.unwrap_err();
    assert!(matches!(err, Error::DaemonNotRunning { .. }));
    assert!(err.is_transport());

    assert!(!client.ping().await.unwrap());
}

#[tokio::test]
async fn test_stream_closed_before_terminator() {
    let daemon = MockDaemon::spawn(|_| Action::Send(br#"{"ok": true, "result": {"#.to_vec()));

    let err = daemon
        .client()
        .invoke("github.repos", Params::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Framing { received } if received > 0));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_malformed_payload_is_decode_error() {
    let daemon = MockDaemon::spawn(|_| Action::Send(b"this is not json\n".to_vec()));

    let err = daemon
        .client()
        .invoke("health", Params::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[tokio::test]
async fn test_unexpected_result_shape_is_decode_error() {
    let daemon = MockDaemon::spawn(|_| success(json!({"repos": "nope"})));

    let err = daemon.client().repos(ReposParams::default()).await.unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[tokio::test]
async fn test_silent_daemon_hits_read_deadline() {
    let daemon = MockDaemon::spawn(|_| Action::Hang);
    let client =
        DaemonClient::new(daemon.config().with_read_timeout(Duration::from_millis(200)));

    let err = client.invoke("health", Params::new()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Timeout {
            phase: CallPhase::Receiving,
            limit,
        } if limit == Duration::from_millis(200)
    ));
    assert!(err.is_transport());
    assert!(err.to_string().contains("200ms"), "{err}");
}

#[tokio::test]
async fn test_health_check() {
    let daemon = MockDaemon::spawn(|request| {
        assert_eq!(request["method"], "health");
        assert_eq!(request["params"], json!({}));
        success(json!({"status": "healthy", "version": "1.0.0"}))
    });
    let client = daemon.client();

    assert!(client.ping().await.unwrap());

    let health = client.health().await.unwrap().unwrap();
    assert_eq!(health.status.as_deref(), Some("healthy"));
}

#[tokio::test]
async fn test_minimal_health_result() {
    let daemon = MockDaemon::spawn(|_| Action::Send(b"{\"ok\": true}\n".to_vec()));
    let health = daemon.client().health().await.unwrap().unwrap();
    assert!(health.status.is_none());
}

#[tokio::test]
async fn test_one_connection_and_one_frame_per_call() {
    let daemon = MockDaemon::spawn(|_| success(json!({})));
    let client = daemon.client();

    for _ in 0..5 {
        client.invoke("health", Params::new()).await.unwrap();
    }

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.invoke("health", Params::new()).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(daemon.connections(), 10);

    let ids: HashSet<String> = daemon
        .requests()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 10);

    // Give the last handlers a moment to observe the client closing
    tokio::time::sleep(Duration::from_millis(50)).await;
    let trailing = daemon.trailing.lock().unwrap().clone();
    assert_eq!(trailing.len(), 10);
    assert!(trailing.iter().all(|&n| n == 0));
}

#[tokio::test]
async fn test_echoed_id_policy() {
    let wrong =
        MockDaemon::spawn(|_| reply(Response::success(Params::new()).with_id("someone-else")));

    // Lenient by default
    assert!(wrong.client().invoke("health", Params::new()).await.is_ok());

    let strict = DaemonClient::new(wrong.config().with_strict_correlation(true));
    let err = strict.invoke("health", Params::new()).await.unwrap_err();
    assert!(matches!(err, Error::CorrelationMismatch { .. }));

    let echo = MockDaemon::spawn(|request| {
        reply(Response::success(Params::new()).with_id(request["id"].as_str().unwrap()))
    });
    let strict = DaemonClient::new(echo.config().with_strict_correlation(true));
    assert!(strict.invoke("health", Params::new()).await.is_ok());
}

#[tokio::test]
async fn test_typed_methods_put_params_on_the_wire() {
    let daemon = MockDaemon::spawn(|_| {
        success(json!({"created": true, "issue": {"number": 42, "title": "Bug"}}))
    });
    let client = daemon.client();

    let created = client
        .create_issue(CreateIssueParams {
            repo: "a/b".into(),
            title: "Bug".into(),
            body: Some("Steps".into()),
            labels: vec!["test".into()],
        })
        .await
        .unwrap()
        .unwrap();
    assert!(created.created);
    assert_eq!(created.issue.unwrap().number, 42);

    client
        .call(&Method::Prs(ListParams {
            repo: "a/b".into(),
            state: Some(State::All),
            limit: Some(3),
        }))
        .await
        .unwrap();

    let requests = daemon.requests();
    assert_eq!(requests[0]["method"], "github.create_issue");
    assert_eq!(
        requests[0]["params"],
        json!({"repo": "a/b", "title": "Bug", "body": "Steps", "labels": ["test"]})
    );
    assert_eq!(requests[1]["method"], "github.prs");
    assert_eq!(
        requests[1]["params"],
        json!({"repo": "a/b", "state": "all", "limit": 3})
    );
}

#[tokio::test]
async fn test_raw_method_passes_through() {
    let daemon = MockDaemon::spawn(|request| {
        success(json!({"echo": request["params"].clone()}))
    });

    let mut params = Params::new();
    params.insert("query".into(), json!("is:unread"));
    let response = daemon
        .client()
        .call(&Method::Raw {
            method: "github.search".into(),
            params,
        })
        .await
        .unwrap();

    let result = response.into_result().unwrap();
    assert_eq!(result["echo"], json!({"query": "is:unread"}));
    assert_eq!(daemon.requests()[0]["method"], "github.search");
}
