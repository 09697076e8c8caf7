use super::*;
use crate::error::AutoselectError;

fn request(paths: &[&str], instructions: &str) -> SelectionRequest {
    SelectionRequest::new(
        "/project",
        paths.iter().map(|p| p.to_string()).collect(),
        instructions,
    )
}

#[test]
fn test_normalize_trims_and_dedupes() {
    let mut req = request(&[" a.py", "b.py ", "a.py"], "  add login  ");
    req.normalize().unwrap();

    assert_eq!(req.instructions, "add login");
    assert_eq!(req.tree_paths, vec!["a.py", "b.py"]);
}

#[test]
fn test_normalize_rejects_empty_instructions() {
    let mut req = request(&["a.py"], "   ");
    let err = req.normalize().unwrap_err();
    assert!(matches!(
        err,
        AutoselectError::Validation(ValidationError::Empty(ref field)) if field == "instructions"
    ));
}

#[test]
fn test_normalize_rejects_empty_tree() {
    let mut req = request(&[], "do things");
    let err = req.normalize().unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::InvalidInput);
}

#[test]
fn test_normalize_rejects_blank_path() {
    let mut req = request(&["a.py", "  "], "do things");
    assert!(req.normalize().is_err());
}

#[test]
fn test_language_bias_normalized() {
    let mut req = request(&["a.py"], "do things");
    req.language_bias = Some(vec!["py".into(), ".TS".into(), " ".into()]);
    req.normalize().unwrap();
    assert_eq!(req.language_bias, Some(vec![".py".to_string(), ".ts".to_string()]));
}

#[test]
fn test_empty_clarifications_dropped() {
    let mut req = request(&["a.py"], "do things");
    req.clarifications = Some(BTreeMap::new());
    req.normalize().unwrap();
    assert!(!req.has_clarifications());
}

#[test]
fn test_request_deserialize_defaults() {
    let json = r#"{"base_dir":"/p","tree_paths":["x.rs"],"instructions":"go"}"#;
    let req: SelectionRequest = serde_json::from_str(json).unwrap();
    assert!(req.language_bias.is_none());
    assert!(req.clarifications.is_none());
    assert!(!req.debug);
}

#[test]
fn test_result_serialization_skips_raw_reply() {
    let result = SelectionResult {
        selected: vec!["a.py".into()],
        confidence: 0.97,
        ask: vec![],
        status: SelectionStatus::Final,
        raw_reply: None,
    };
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "final");
    assert!(json.get("raw_reply").is_none());
    assert!(result.is_final());
}

#[test]
fn test_symbol_summary_failure_shape() {
    let summary = SymbolSummary::failed(FailureKind::TooLarge, "5000000 bytes");
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["error"], "too_large");

    let back: SymbolSummary = serde_json::from_value(json).unwrap();
    assert_eq!(back.failure(), Some(FailureKind::TooLarge));
}

#[test]
fn test_symbol_summary_codemap_shape() {
    let json = r#"{"classes":["A"],"functions":[],"references":[],"imports":[],"exports":[]}"#;
    let summary: SymbolSummary = serde_json::from_str(json).unwrap();
    let map = summary.codemap().unwrap();
    assert_eq!(map.classes, vec!["A"]);
    assert!(!map.is_empty());
}

#[test]
fn test_codemap_is_empty() {
    assert!(Codemap::default().is_empty());
}
