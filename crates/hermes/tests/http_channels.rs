//! HTTP channels against a local capture server.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use hermes::notification::channels::{
    JiraChannel, JiraConfig, OutlookChannel, OutlookConfig, TeamsChannel, TeamsConfig,
};
use hermes::notification::NotificationChannel;
use hermes::settings::{JIRA_EMAIL, JIRA_PROJECT, JIRA_TOKEN, JIRA_URL, TEAMS_WEBHOOK};
use hermes::utils::http_client::build_client;
use hermes::{ContextCollector, Error, Message, Notifier};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
struct Captured {
    route: String,
    authorization: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct Capture {
    requests: Arc<Mutex<Vec<Captured>>>,
}

impl Capture {
    fn take(&self) -> Vec<Captured> {
        std::mem::take(&mut *self.requests.lock().unwrap())
    }

    fn record(&self, route: &str, headers: &HeaderMap, body: Value) {
        self.requests.lock().unwrap().push(Captured {
            route: route.to_string(),
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        });
    }
}

async fn webhook(
    State(capture): State<Capture>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    capture.record("webhook", &headers, body);
    (StatusCode::OK, "1")
}

async fn create_issue(
    State(capture): State<Capture>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    capture.record("issue", &headers, body);
    (
        StatusCode::CREATED,
        Json(json!({ "id": "10001", "key": "OPS-42", "self": "https://example/10001" })),
    )
}

async fn send_mail(
    State(capture): State<Capture>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    capture.record("sendMail", &headers, body);
    StatusCode::ACCEPTED
}

async fn broken(Path(route): Path<String>, Json(_): Json<Value>) -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{route} is down"))
}

async fn spawn_server() -> (SocketAddr, Capture) {
    let capture = Capture::default();
    let app = Router::new()
        .route("/webhook", post(webhook))
        .route("/rest/api/3/issue", post(create_issue))
        .route("/sendMail", post(send_mail))
        .route("/broken/{route}", post(broken))
        .with_state(capture.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, capture)
}

fn message() -> Message {
    Message::new("[jobs] has failed.", "Error: boom")
}

#[tokio::test]
async fn teams_posts_markdown_text() {
    let (addr, capture) = spawn_server().await;
    let channel = TeamsChannel::new(
        TeamsConfig::new(format!("http://{addr}/webhook")),
        build_client(),
    );

    let receipt = channel.deliver(&message()).await.unwrap();
    assert!(receipt.reference.is_none());

    let requests = capture.take();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].route, "webhook");
    assert_eq!(
        requests[0].body,
        json!({ "text": "**[jobs] has failed.**\n\nError: boom" })
    );
}

#[tokio::test]
async fn jira_creates_issue_with_basic_auth() {
    let (addr, capture) = spawn_server().await;
    let config = JiraConfig::new(format!("http://{addr}/"), "bot@example.com", "secret", "OPS");
    let channel = JiraChannel::new(config, build_client());

    let receipt = channel.deliver(&message()).await.unwrap();
    assert_eq!(receipt.reference.as_deref(), Some("OPS-42"));

    let requests = capture.take();
    assert_eq!(requests.len(), 1);
    // base64("bot@example.com:secret")
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Basic Ym90QGV4YW1wbGUuY29tOnNlY3JldA==")
    );
    assert_eq!(
        requests[0].body,
        json!({
            "fields": {
                "summary": "[jobs] has failed.",
                "description": "Error: boom",
                "project": { "key": "OPS" },
                "issuetype": { "name": "Task" },
            }
        })
    );
}

#[tokio::test]
async fn outlook_sends_with_bearer_token() {
    let (addr, capture) = spawn_server().await;
    let config = OutlookConfig {
        endpoint: format!("http://{addr}/sendMail"),
        ..OutlookConfig::new("graph-token", "from@example.com", "to@example.com")
    };
    let channel = OutlookChannel::new(config, build_client());

    channel.deliver(&message()).await.unwrap();

    let requests = capture.take();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer graph-token"));

    let body = &requests[0].body;
    assert_eq!(body["message"]["subject"], "[jobs] has failed.");
    assert_eq!(body["message"]["body"]["content"], "Error: boom");
    assert_eq!(
        body["message"]["toRecipients"][0]["emailAddress"]["address"],
        "to@example.com"
    );
    assert_eq!(body["saveToSentItems"], "false");
}

#[tokio::test]
async fn non_success_status_is_a_channel_error() {
    let (addr, _) = spawn_server().await;
    let channel = TeamsChannel::new(
        TeamsConfig::new(format!("http://{addr}/broken/teams")),
        build_client(),
    );

    let error = channel.deliver(&message()).await.unwrap_err();
    match error {
        Error::Channel { channel, message } => {
            assert_eq!(channel, "teams");
            assert!(message.starts_with("500"));
            assert!(message.ends_with("teams is down"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn notifier_reaches_http_channels_despite_dead_smtp_relay() {
    let (addr, capture) = spawn_server().await;
    let url = format!("http://{addr}");
    let webhook = format!("http://{addr}/webhook");

    let settings: HashMap<String, String> = [
        (TEAMS_WEBHOOK, webhook.as_str()),
        (JIRA_URL, url.as_str()),
        (JIRA_EMAIL, "bot@example.com"),
        (JIRA_TOKEN, "secret"),
        (JIRA_PROJECT, "OPS"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let notifier = Notifier::builder("from@example.com", "to@example.com")
        .label("nightly")
        .retries(0)
        .smtp("127.0.0.1", 9)
        .settings(settings)
        .context(ContextCollector::fixed("worker-7", "alice"))
        .build();

    let execution = notifier
        .execute("explode", || async { Err::<(), _>("boom".to_string()) })
        .await;
    assert_eq!(execution.result, Err("boom".to_string()));

    let report = execution.report.unwrap();
    assert!(!report.outcome("smtp").unwrap().is_delivered());
    assert!(report.outcome("teams").unwrap().is_delivered());
    assert_eq!(
        report.outcome("jira").unwrap().result,
        Ok(hermes::notification::DeliveryReceipt::with_reference("OPS-42"))
    );

    let requests = capture.take();
    let routes: Vec<&str> = requests.iter().map(|r| r.route.as_str()).collect();
    assert_eq!(routes, vec!["webhook", "issue"]);
    assert_eq!(requests[1].body["fields"]["summary"], "[nightly] has failed.");
    assert!(
        requests[1].body["fields"]["description"]
            .as_str()
            .unwrap()
            .contains("Machine: worker-7")
    );
}
