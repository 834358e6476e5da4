use super::*;

#[test]
fn scene_errors_keep_their_codes() {
    let err = SceneError::DuplicateId("n1".into());
    assert_eq!(ErrorCode::error_code(&err), "E_DUPLICATE_ID");
    assert!(!err.retryable());
}

#[test]
fn scene_error_display_is_preserved() {
    let err = SceneError::UnknownParent("g".into());
    assert_eq!(err.to_string(), "parent not found: g");
}
