use super::*;
use crate::error::ErrorKind;
use crate::llm::testing::{ScriptedBackend, reply};
use tempfile::TempDir;

const LOGIN: &str = "from utils.email import send_email\n\nclass LoginService:\n    def reset_password(self, email):\n        send_email(email)\n";
const EMAIL: &str = "import smtplib\n\ndef send_email(to):\n    pass\n";

fn offline_config() -> Config {
    let mut config = Config::default();
    config.embedding.model_name = HASH_EMBEDDER_NAME.to_string();
    config
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("auth")).unwrap();
    std::fs::create_dir_all(dir.path().join("utils")).unwrap();
    std::fs::write(dir.path().join("auth/login_service.py"), LOGIN).unwrap();
    std::fs::write(dir.path().join("utils/email.py"), EMAIL).unwrap();
    dir
}

fn create_test_client(backend: Option<Arc<ScriptedBackend>>) -> AutoselectClient {
    AutoselectClient::with_components(
        offline_config(),
        Arc::new(HashEmbedder::new()),
        backend.map(|b| b as Arc<dyn CompletionBackend>),
    )
}

fn tree() -> Vec<String> {
    vec![
        "auth/login_service.py".to_string(),
        "utils/email.py".to_string(),
    ]
}

// ===== Client Initialization Tests =====

#[tokio::test]
async fn test_with_config_without_api_key() {
    let client = AutoselectClient::with_config(offline_config()).await.unwrap();
    assert_eq!(client.embedding_dimension(), 256);

    let dir = project();
    let err = client
        .select_files(SelectionRequest::new(
            dir.path().to_string_lossy(),
            tree(),
            "fix login",
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("LLM_API_KEY"));
}

#[tokio::test]
async fn test_with_config_with_api_key() {
    let mut config = offline_config();
    config.llm.api_key = Some("sk-test".to_string());
    assert!(AutoselectClient::with_config(config).await.is_ok());
}

#[tokio::test]
async fn test_with_config_unknown_model() {
    let mut config = offline_config();
    config.embedding.model_name = "no-such-model".to_string();
    let err = AutoselectClient::with_config(config).await.err().unwrap();
    assert!(matches!(err, AutoselectError::Embedding(_)));
}

#[tokio::test]
async fn test_config_accessor() {
    let client = create_test_client(None);
    assert_eq!(client.config().embedding.model_name, HASH_EMBEDDER_NAME);
    assert_eq!(client.indexed_projects().await, 0);
}

// ===== extract_symbols Tests =====

#[tokio::test]
async fn test_extract_symbols() {
    let client = create_test_client(None);
    let dir = project();

    let response = client
        .extract_symbols(ExtractSymbolsRequest {
            base_dir: dir.path().to_string_lossy().into_owned(),
            relative_paths: vec![
                "auth/login_service.py".to_string(),
                "missing.py".to_string(),
            ],
        })
        .await
        .unwrap();

    assert_eq!(response.summaries.len(), 2);
    let login = response.summaries["auth/login_service.py"].codemap().unwrap();
    assert_eq!(login.classes, vec!["LoginService"]);
    assert_eq!(
        response.summaries["missing.py"].failure(),
        Some(FailureKind::Unreadable)
    );
}

#[tokio::test]
async fn test_extract_symbols_is_idempotent() {
    let client = create_test_client(None);
    let dir = project();
    let request = ExtractSymbolsRequest {
        base_dir: dir.path().to_string_lossy().into_owned(),
        relative_paths: tree(),
    };

    let first = client.extract_symbols(request.clone()).await.unwrap();
    let second = client.extract_symbols(request).await.unwrap();
    assert_eq!(first.summaries, second.summaries);
}

#[tokio::test]
async fn test_extract_symbols_bad_base_dir() {
    let client = create_test_client(None);

    let err = client
        .extract_symbols(ExtractSymbolsRequest {
            base_dir: "/nonexistent/path/12345".to_string(),
            relative_paths: tree(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);

    let err = client
        .extract_symbols(ExtractSymbolsRequest {
            base_dir: "  ".to_string(),
            relative_paths: tree(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// ===== select_files / refresh_file Tests =====

#[tokio::test]
async fn test_select_files() {
    let backend = ScriptedBackend::replying(reply(&["utils/email.py"], 0.98));
    let client = create_test_client(Some(backend.clone()));
    let dir = project();

    let result = client
        .select_files(SelectionRequest::new(
            dir.path().to_string_lossy(),
            tree(),
            "send password reset emails",
        ))
        .await
        .unwrap();

    assert_eq!(result.selected, vec!["utils/email.py"]);
    assert!(result.is_final());
    assert_eq!(backend.calls(), 1);
    assert_eq!(client.indexed_projects().await, 1);
}

#[tokio::test]
async fn test_clones_share_indexes() {
    let backend = ScriptedBackend::replying(reply(&["utils/email.py"], 0.98));
    let client = create_test_client(Some(backend));
    let cloned = client.clone();
    let dir = project();

    client
        .select_files(SelectionRequest::new(
            dir.path().to_string_lossy(),
            tree(),
            "send email",
        ))
        .await
        .unwrap();
    assert_eq!(cloned.indexed_projects().await, 1);
}

#[tokio::test]
async fn test_refresh_file_upserts() {
    let client = create_test_client(None);
    let dir = project();
    let base = dir.path().to_string_lossy().into_owned();

    client.refresh_file(&base, "utils/email.py").await.unwrap();
    // Refreshing again replaces rather than duplicates
    std::fs::write(dir.path().join("utils/email.py"), "def send_sms(to):\n    pass\n").unwrap();
    client.refresh_file(&base, "utils/email.py").await.unwrap();
    client
        .refresh_file(&base, "auth/login_service.py")
        .await
        .unwrap();

    let index = client.indexes.get_or_create(dir.path()).await;
    assert_eq!(index.len().await, 2);
    let hits = index.top_k("send sms", 1).await.unwrap();
    assert_eq!(hits, vec!["utils/email.py"]);
}

#[tokio::test]
async fn test_refresh_missing_file() {
    let client = create_test_client(None);
    let dir = project();

    let err = client
        .refresh_file(&dir.path().to_string_lossy(), "nope.py")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
}
