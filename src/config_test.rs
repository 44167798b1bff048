use std::collections::HashMap;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_are_offline() {
    let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config.data_dir, PathBuf::from("./oasis-data"));
    assert_eq!(config.api_url, None);
    assert_eq!(config.api_timeout, Duration::from_secs(10));
}

#[test]
fn api_url_trailing_slash_trimmed() {
    let config = StoreConfig::from_lookup(lookup(&[("OASIS_API_URL", "https://api.example.com/")])).unwrap();
    assert_eq!(config.api_url.as_deref(), Some("https://api.example.com"));
}

#[test]
fn blank_api_url_means_offline() {
    let config = StoreConfig::from_lookup(lookup(&[("OASIS_API_URL", "  ")])).unwrap();
    assert_eq!(config.api_url, None);
}

#[test]
fn non_http_api_url_rejected() {
    let err = StoreConfig::from_lookup(lookup(&[("OASIS_API_URL", "ftp://x")])).unwrap_err();
    assert_eq!(err, ConfigError::InvalidApiUrl("ftp://x".into()));
    assert_eq!(err.error_code(), "E_CONFIG_API_URL");
}

#[test]
fn empty_data_dir_rejected() {
    let err = StoreConfig::from_lookup(lookup(&[("OASIS_DATA_DIR", "")])).unwrap_err();
    assert_eq!(err, ConfigError::EmptyDataDir);
}

#[test]
fn timeout_parsed_and_garbage_falls_back() {
    let config = StoreConfig::from_lookup(lookup(&[("OASIS_API_TIMEOUT_SECS", " 3 ")])).unwrap();
    assert_eq!(config.api_timeout, Duration::from_secs(3));
    let config = StoreConfig::from_lookup(lookup(&[("OASIS_API_TIMEOUT_SECS", "soon")])).unwrap();
    assert_eq!(config.api_timeout, Duration::from_secs(10));
}

#[test]
fn zero_timeout_rejected() {
    let err = StoreConfig::from_lookup(lookup(&[("OASIS_API_TIMEOUT_SECS", "0")])).unwrap_err();
    assert_eq!(err, ConfigError::ZeroTimeout);
}

#[test]
fn env_parse_reads_process_environment() {
    // SAFETY: test-only, unique variable name.
    unsafe { std::env::set_var("OASIS_TEST_ENV_PARSE_U64", "42") };
    assert_eq!(env_parse("OASIS_TEST_ENV_PARSE_U64", 7_u64), 42);
    assert_eq!(env_parse("OASIS_TEST_ENV_PARSE_MISSING", 7_u64), 7);
    unsafe { std::env::remove_var("OASIS_TEST_ENV_PARSE_U64") };
}
