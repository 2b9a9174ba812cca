//! Integration tests exercising the whole node:
//! HTTP → services → LMDB + upload directory → HTTP scorer stub → readback.

use std::net::SocketAddr;
use std::path::Path;

use axum::routing::post;
use axum::{Json, Router};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use sigver_node::{NodeConfig, SigverNode};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Scorer stub answering like the newer scorer deployments.
async fn spawn_scorer(response: Value) -> SocketAddr {
    let router = Router::new().route(
        "/verify-signature/",
        post(move || {
            let response = response.clone();
            async move { Json(response) }
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn config(data_dir: &Path, scorer: SocketAddr) -> NodeConfig {
    NodeConfig {
        listen_addr: "127.0.0.1".parse().unwrap(),
        port: 0,
        data_dir: data_dir.to_path_buf(),
        scorer_url: format!("http://{scorer}"),
        scorer_timeout_secs: 5,
        token_secret: Some("integration-secret".into()),
        lmdb_map_size: 64 * 1024 * 1024,
        ..NodeConfig::default()
    }
}

struct RunningNode {
    base: String,
    stop: std::sync::Arc<sigver_node::ShutdownController>,
    task: JoinHandle<Result<(), sigver_node::NodeError>>,
}

impl RunningNode {
    async fn start(config: NodeConfig) -> Self {
        let node = SigverNode::new(config).expect("node starts");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let stop = node.shutdown_handle();
        let task = tokio::spawn(node.serve(listener));
        Self { base, stop, task }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn stop(self) {
        self.stop.shutdown();
        self.task.await.unwrap().expect("clean shutdown");
    }
}

fn image_part(name: &str, bytes: Vec<u8>) -> Part {
    Part::bytes(bytes)
        .file_name(name.to_string())
        .mime_str("image/png")
        .unwrap()
}

async fn register(client: &reqwest::Client, node: &RunningNode) -> String {
    let response = client
        .post(node.url("/api/auth/register"))
        .json(&json!({"username": "alice", "email": "a@x.com", "password": "secret1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_verification_flow_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let scorer = spawn_scorer(json!({"verdict": "genuine", "similarity": 0.93})).await;
    let node = RunningNode::start(config(dir.path(), scorer)).await;
    let client = reqwest::Client::new();

    let health = client.get(node.url("/")).send().await.unwrap();
    assert_eq!(health.text().await.unwrap(), "Signature Verification API is running");

    let token = register(&client, &node).await;

    let form = Form::new()
        .part("signature", image_part("R.png", vec![1; 64]))
        .text("description", "ink on paper");
    let response = client
        .post(node.url("/api/signatures/reference"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let uploaded: Value = response.json().await.unwrap();
    let filename = uploaded["signature"]["filename"].as_str().unwrap();
    assert!(dir.path().join("uploads").join(filename).exists());

    let form = Form::new().part("verification_signature", image_part("P.png", vec![2; 64]));
    let response = client
        .post(node.url("/api/signatures/verify"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result"]["match"], true);
    assert_eq!(body["result"]["similarity_score"], 0.93);

    let body: Value = client
        .get(node.url("/api/auth/history"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["isAuthentic"], true);
    assert_eq!(history[0]["similarityScore"], 0.93);

    let logout = client
        .post(node.url("/api/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(logout.status(), 200);
    let profile = client
        .get(node.url("/api/auth/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(profile.status(), 401);

    node.stop().await;
}

#[tokio::test]
async fn label_only_scorer_gets_fallback_score() {
    let dir = tempfile::tempdir().unwrap();
    let scorer = spawn_scorer(json!({"result": "Forged"})).await;
    let node = RunningNode::start(config(dir.path(), scorer)).await;
    let client = reqwest::Client::new();
    let token = register(&client, &node).await;

    client
        .post(node.url("/api/signatures/reference"))
        .bearer_auth(&token)
        .multipart(Form::new().part("signature", image_part("R.png", vec![1; 8])))
        .send()
        .await
        .unwrap();

    let body: Value = client
        .post(node.url("/api/signatures/verify"))
        .bearer_auth(&token)
        .multipart(Form::new().part("verification_signature", image_part("P.png", vec![2; 8])))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["result"]["match"], false);
    assert_eq!(body["result"]["similarity_score"], 0.15);
    assert_eq!(body["result"]["score_source"], "fallback");

    node.stop().await;
}

#[tokio::test]
async fn accounts_and_references_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let scorer = spawn_scorer(json!({"match": true, "similarity_score": 0.7})).await;
    let client = reqwest::Client::new();

    let node = RunningNode::start(config(dir.path(), scorer)).await;
    let token = register(&client, &node).await;
    let response = client
        .post(node.url("/api/signatures/reference"))
        .bearer_auth(&token)
        .multipart(Form::new().part("signature", image_part("R.png", vec![1; 8])))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    node.stop().await;

    let node = RunningNode::start(config(dir.path(), scorer)).await;
    let response = client
        .post(node.url("/api/auth/login"))
        .json(&json!({"email": "a@x.com", "password": "secret1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Same secret, so the token from before the restart is still good.
    let body: Value = client
        .get(node.url("/api/signatures/references"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["signatures"].as_array().unwrap().len(), 1);

    node.stop().await;
}

#[test]
fn invalid_config_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let config = NodeConfig {
        data_dir: dir.path().to_path_buf(),
        scorer_url: "not a url".into(),
        ..NodeConfig::default()
    };
    assert!(SigverNode::new(config).is_err());
}
