use std::time::Duration;

use acebot::RetryConfig;

#[test]
fn retry_config_defaults() {
    let config = RetryConfig::default();
    assert_eq!(config.max_attempts, 20);
    assert_eq!(config.overload_delay, Duration::from_millis(800));
    assert!(!config.random_start);
    assert_eq!(config.min_credential_len, 10);
}

#[test]
fn retry_config_builder() {
    let config = RetryConfig::new()
        .max_attempts(5)
        .overload_delay(Duration::from_millis(100))
        .random_start(true)
        .min_credential_len(4);

    assert_eq!(config.max_attempts, 5);
    assert_eq!(config.overload_delay, Duration::from_millis(100));
    assert!(config.random_start);
    assert_eq!(config.min_credential_len, 4);
}
