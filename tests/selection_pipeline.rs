//! End-to-end selection through AutoselectClient with a mocked upstream

use project_autoselect::embedding::HASH_EMBEDDER_NAME;
use project_autoselect::{AutoselectClient, Config, ErrorKind, SelectionRequest, SelectionStatus};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const TREE: [&str; 4] = [
    "auth/login_service.py",
    "utils/email.py",
    "unrelated/data.py",
    "docs/README.md",
];

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    for (rel, body) in [
        (
            TREE[0],
            "from utils.email import send_email\n\nclass LoginService:\n    def reset_password(self, email):\n        send_email(email)\n",
        ),
        (TREE[1], "import smtplib\n\ndef send_email(to):\n    pass\n"),
        (TREE[2], "import csv\n\ndef parse_rows(path):\n    pass\n"),
        (TREE[3], "# Project\n\n## Authentication\n"),
    ] {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }
    dir
}

async fn client_for(server: &MockServer) -> AutoselectClient {
    let mut config = Config::default();
    config.embedding.model_name = HASH_EMBEDDER_NAME.to_string();
    config.llm.api_url = format!("{}/chat", server.uri());
    config.llm.api_key = Some("sk-test".to_string());
    AutoselectClient::with_config(config).await.unwrap()
}

fn reply(content: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "content": content.to_string() } }]
    }))
}

fn request(dir: &TempDir, instructions: &str) -> SelectionRequest {
    SelectionRequest::new(
        dir.path().to_string_lossy(),
        TREE.iter().map(|p| p.to_string()).collect(),
        instructions,
    )
}

#[tokio::test]
async fn test_two_round_clarification() {
    let server = MockServer::start().await;
    let dir = project();
    let client = client_for(&server).await;

    Mock::given(method("POST"))
        .respond_with(reply(json!({
            "selected": ["auth/login_service.py"],
            "confidence": 0.5,
            "ask": ["Should users get a reset email?"]
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(reply(json!({
            "selected": ["auth/login_service.py", "Utils/Email.py"],
            "confidence": 0.8
        })))
        .mount(&server)
        .await;

    let first = client
        .select_files(request(&dir, "add password reset"))
        .await
        .unwrap();
    assert_eq!(first.status, SelectionStatus::NeedsClarification);
    assert_eq!(first.ask, vec!["Should users get a reset email?"]);

    let mut second = request(&dir, "add password reset");
    second.clarifications = Some(
        first
            .ask
            .iter()
            .map(|q| (q.clone(), "yes".to_string()))
            .collect(),
    );
    let second = client.select_files(second).await.unwrap();
    assert_eq!(second.status, SelectionStatus::Final);
    assert_eq!(second.selected, vec!["auth/login_service.py", "utils/email.py"]);
    assert!(second.ask.is_empty());
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;
    let dir = project();
    let client = client_for(&server).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(reply(json!({ "selected": ["utils/email.py"], "confidence": 1.0 })))
        .mount(&server)
        .await;

    let result = client
        .select_files(request(&dir, "send email"))
        .await
        .unwrap();
    assert_eq!(result.selected, vec!["utils/email.py"]);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_rejected_key_is_not_retried() {
    let server = MockServer::start().await;
    let dir = project();
    let client = client_for(&server).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let err = client
        .select_files(request(&dir, "send email"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_prompt_lists_every_candidate() {
    let server = MockServer::start().await;
    let dir = project();
    let client = client_for(&server).await;

    Mock::given(method("POST"))
        .respond_with(reply(json!({ "selected": [], "confidence": 1.0 })))
        .mount(&server)
        .await;

    let mut req = request(&dir, "add password reset");
    req.debug = true;
    let result = client.select_files(req).await.unwrap();
    assert!(result.selected.is_empty());
    assert_eq!(result.raw_reply.unwrap()["selected"], json!([]));

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    for path in TREE {
        assert!(prompt.contains(&format!("• {}", path)), "{path} missing from prompt");
    }
}
