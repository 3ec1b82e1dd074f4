use std::fs;
use std::path::PathBuf;

use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use tempfile::tempdir;
use wallstash::config::{Config, ConfigError};

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config.cache_capacity, 10);
    assert_eq!(config.save_quality, 100);
    assert_eq!(config.download_workers, 4);
    assert!(config.download_dir.ends_with("WallHaven Wallpapers"));
}

#[test]
fn test_config_load_from_env() {
    // Only this test touches this variable.
    std::env::set_var("WALLSTASH_REQUEST_TIMEOUT_SECS", "7");

    use figment::providers::Env;
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("WALLSTASH_"))
        .extract()
        .unwrap();
    assert_eq!(config.request_timeout_secs, 7);

    std::env::remove_var("WALLSTASH_REQUEST_TIMEOUT_SECS");
}

#[test]
fn test_config_load_from_toml_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
download_dir = "/srv/wallpapers"
cache_capacity = 25
save_quality = 80
download_workers = 2
"#,
    )
    .unwrap();

    let config = Config::load(Some(config_path.as_path())).unwrap();

    assert_eq!(config.download_dir, PathBuf::from("/srv/wallpapers"));
    assert_eq!(config.cache_capacity, 25);
    assert_eq!(config.save_quality, 80);
    assert_eq!(config.download_workers, 2);
    // Unset keys keep their defaults.
    assert_eq!(config.api_base_url, Config::default().api_base_url);
}

#[test]
fn test_config_rejects_invalid_values() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "cache_capacity = 0\n").unwrap();

    let err = Config::load(Some(config_path.as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("cache_capacity"));
}

#[test]
fn test_config_rejects_wrong_types() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "save_quality = \"high\"\n").unwrap();

    let err = Config::load(Some(config_path.as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn test_config_invalid_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "invalid = toml").unwrap();

    let result: Result<Config, _> = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract();
    assert!(result.is_err());
}

#[test]
fn test_config_toml_round_trip() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let mut config = Config::default();
    config.cache_capacity = 3;
    config.download_dir = PathBuf::from("/tmp/walls");
    let rendered = config.to_toml().unwrap();
    assert!(rendered.contains("cache_capacity = 3"));
    fs::write(&config_path, rendered).unwrap();

    let loaded = Config::load(Some(config_path.as_path())).unwrap();
    assert_eq!(loaded.cache_capacity, 3);
    assert_eq!(loaded.download_dir, PathBuf::from("/tmp/walls"));
}
