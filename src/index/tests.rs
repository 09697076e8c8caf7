use super::*;
use crate::embedding::HashEmbedder;
use crate::error::ErrorKind;
use tempfile::TempDir;

fn project_index(min_similarity: f32, batch_size: usize) -> ProjectIndex {
    let config = EmbeddingConfig {
        min_similarity,
        batch_size,
        ..EmbeddingConfig::default()
    };
    ProjectIndex::new(
        PathBuf::from("/project"),
        Arc::new(HashEmbedder::new()),
        &config,
    )
}

fn summaries(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(path, text)| (path.to_string(), text.to_string()))
        .collect()
}

/// Claims a dimension it does not produce
struct LyingProvider;

impl EmbeddingProvider for LyingProvider {
    fn embed_batch(&self, texts: Vec<String>) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|_| vec![1.0; 3]).collect())
    }

    fn dimension(&self) -> usize {
        8
    }

    fn model_name(&self) -> &str {
        "lying"
    }
}

#[tokio::test]
async fn test_empty_index_returns_nothing() {
    let index = project_index(0.1, 32);
    assert!(index.is_empty().await);
    assert!(index.top_k("password reset", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_top_k_orders_by_similarity_and_applies_floor() {
    let index = project_index(0.1, 32);
    let count = index
        .index(&summaries(&[
            ("auth/reset.py", "password reset email"),
            ("utils/mailer.py", "email smtp sender"),
            ("data/rows.py", "csv parser rows"),
        ]))
        .await
        .unwrap();
    assert_eq!(count, 3);

    let hits = index.top_k("password reset email", 10).await.unwrap();
    assert_eq!(hits, vec!["auth/reset.py", "utils/mailer.py"]);

    let scored = index.top_k_scored("password reset email", 1).await.unwrap();
    assert_eq!(scored.len(), 1);
    assert!((scored[0].1 - 1.0).abs() < 1e-5);
}

#[tokio::test]
async fn test_equal_similarity_ties_break_by_path() {
    let index = project_index(0.1, 32);
    index
        .index(&summaries(&[
            ("b/email.py", "email smtp"),
            ("a/email.py", "email smtp"),
        ]))
        .await
        .unwrap();

    let hits = index.top_k("email", 2).await.unwrap();
    assert_eq!(hits, vec!["a/email.py", "b/email.py"]);
}

#[tokio::test]
async fn test_rebuild_replaces_previous_records() {
    let index = project_index(0.1, 1);
    index
        .index(&summaries(&[("old.py", "password reset")]))
        .await
        .unwrap();
    index
        .index(&summaries(&[("new.py", "csv rows"), ("other.py", "smtp sender")]))
        .await
        .unwrap();

    assert_eq!(index.len().await, 2);
    assert!(index.top_k("password reset", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upsert_replaces_single_vector() {
    let index = project_index(0.1, 32);
    index
        .index(&summaries(&[("a.py", "csv rows"), ("b.py", "smtp sender")]))
        .await
        .unwrap();

    index.upsert("a.py", "password reset email").await.unwrap();
    assert_eq!(index.len().await, 2);
    assert_eq!(index.top_k("password reset", 5).await.unwrap(), vec!["a.py"]);

    index.upsert("c.py", "csv rows").await.unwrap();
    assert_eq!(index.len().await, 3);
    assert_eq!(index.top_k("csv rows", 5).await.unwrap(), vec!["c.py"]);
}

#[tokio::test]
async fn test_zero_k() {
    let index = project_index(0.1, 32);
    index
        .index(&summaries(&[("a.py", "email")]))
        .await
        .unwrap();
    assert!(index.top_k("email", 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dimension_mismatch_is_rejected() {
    let index = ProjectIndex::new(
        PathBuf::from("/project"),
        Arc::new(LyingProvider),
        &EmbeddingConfig::default(),
    );

    let err = index
        .index(&summaries(&[("a.py", "email")]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        crate::error::AutoselectError::Embedding(EmbeddingError::DimensionMismatch {
            expected: 8,
            actual: 3
        })
    ));
    assert_eq!(err.kind(), ErrorKind::UpstreamService);
    assert!(index.is_empty().await);
}

#[tokio::test]
async fn test_registry_keeps_one_index_per_root() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let registry = IndexRegistry::new(Arc::new(HashEmbedder::new()), EmbeddingConfig::default());

    let a = registry.get_or_create(first.path()).await;
    let again = registry.get_or_create(first.path()).await;
    assert!(Arc::ptr_eq(&a, &again));

    registry
        .index(first.path(), &summaries(&[("mail.py", "email smtp")]))
        .await
        .unwrap();
    assert_eq!(
        registry.top_k(first.path(), "email", 5).await.unwrap(),
        vec!["mail.py"]
    );

    // different projects never share state
    assert!(registry.top_k(second.path(), "email", 5).await.unwrap().is_empty());
    assert_eq!(registry.project_count().await, 2);
}

#[tokio::test]
async fn test_registry_upsert_creates_index() {
    let root = TempDir::new().unwrap();
    let registry = IndexRegistry::new(Arc::new(HashEmbedder::new()), EmbeddingConfig::default());

    registry
        .upsert(root.path(), "auth/reset.py", "password reset")
        .await
        .unwrap();
    assert_eq!(registry.get_or_create(root.path()).await.len().await, 1);
}
