use crate::HttpStatusCode;

#[test]
fn given_2xx_codes_when_classified_then_only_they_are_success() {
    assert!(HttpStatusCode(200).is_success());
    assert!(HttpStatusCode(204).is_success());
    assert!(!HttpStatusCode(199).is_success());
    assert!(!HttpStatusCode(301).is_success());
    assert!(!HttpStatusCode(500).is_success());
}

/// **VALUE**: A rejected secret is a hard failure, not a transient one.
///
/// **BUG THIS CATCHES**: Would catch a retry policy that keeps hammering the
/// backend with a secret it has already refused.
#[test]
fn given_auth_failures_when_classified_then_neither_success_nor_retryable() {
    for code in [401, 403] {
        let status = HttpStatusCode::from(code);

        assert!(!status.is_success(), "{code} is not a success");
        assert!(!status.is_retryable(), "{code} should not be retried");
    }
}

#[test]
fn given_gateway_errors_when_classified_then_retryable() {
    for code in [502, 503, 504, 429] {
        assert!(HttpStatusCode(code).is_retryable(), "{code} should be retryable");
    }
    assert!(!HttpStatusCode(500).is_retryable());
}
