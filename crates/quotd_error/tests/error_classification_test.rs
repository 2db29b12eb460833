//! Tests for retry classification of provider errors.

use quotd_error::{
    FetchError, FetchErrorKind, NETWORK_ERROR_STATUS, QuotdError, QuotdErrorKind,
    RateLimitError, RateLimitErrorKind, RetryableError, ValidationError, ValidationErrorKind,
};

const DEFAULT_RETRYABLE: &[u16] = &[500, 502, 503, 504, NETWORK_ERROR_STATUS];

#[test]
fn test_server_errors_are_retryable() {
    for status in [500, 502, 503, 504] {
        let err = FetchError::new(FetchErrorKind::from_status(status, "upstream failed"));
        assert!(
            matches!(err.kind, FetchErrorKind::Api { .. }),
            "{} should classify as Api",
            status
        );
        assert!(err.is_retryable(DEFAULT_RETRYABLE), "{} should retry", status);
    }
}

#[test]
fn test_client_errors_are_permanent() {
    for status in [400, 401, 403, 404] {
        let err = FetchError::new(FetchErrorKind::from_status(status, "rejected"));
        assert!(matches!(err.kind, FetchErrorKind::Client { .. }));
        assert!(!err.is_retryable(DEFAULT_RETRYABLE), "{} should not retry", status);
    }
}

#[test]
fn test_network_error_uses_sentinel_status() {
    let err = FetchError::new(FetchErrorKind::Network("dns failure".to_string()));
    assert_eq!(err.status_code(), Some(0));
    assert!(err.is_retryable(DEFAULT_RETRYABLE));
}

#[test]
fn test_validation_errors_never_retry() {
    let validation = ValidationError::new(ValidationErrorKind::TextLength {
        length: 3,
        min: 10,
        max: 150,
    });
    let err: FetchError = validation.into();
    assert_eq!(err.status_code(), None);
    assert!(!err.is_retryable(&[0, 400, 500]));
}

#[test]
fn test_rate_limit_rejection_maps_to_429() {
    let limit = RateLimitError::new(RateLimitErrorKind::QueueTimeout {
        key: "api.example.com/random".to_string(),
        waited_ms: 50,
    });
    assert!(limit.is_overload());

    let err: FetchError = limit.into();
    assert!(err.is_rate_limited());
    assert_eq!(err.status_code(), Some(429));
    assert!(!err.is_retryable(DEFAULT_RETRYABLE));
    assert!(err.is_retryable(&[429]));
}

#[test]
fn test_errors_convert_to_top_level() {
    let err: QuotdError = FetchError::new(FetchErrorKind::Decode("not json".to_string())).into();
    assert!(matches!(err.kind(), QuotdErrorKind::Fetch(_)));
    assert!(format!("{}", err).contains("Malformed response"));
}
