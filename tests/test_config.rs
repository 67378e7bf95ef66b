use std::time::Duration;

use wicket::config::{Config, ConfigError};

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.server.listen_addr, "0.0.0.0:8080");
    assert_eq!(cfg.admin.listen_addr, "127.0.0.1:6000");
    assert_eq!(cfg.admin.passphrase, "さようなら");
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_config_from_yaml_fills_missing_fields() {
    let cfg = Config::from_yaml(
        r#"
server:
  listen_addr: "127.0.0.1:9000"
  max_connections: 8
admin:
  passphrase: "open sesame"
"#,
    )
    .unwrap();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:9000");
    assert_eq!(cfg.server.max_connections, 8);
    assert_eq!(cfg.server.read_timeout_ms, 10_000);
    assert_eq!(cfg.admin.listen_addr, "127.0.0.1:6000");
    assert_eq!(cfg.admin.host, "localhost");
    assert_eq!(cfg.admin.passphrase, "open sesame");
}

#[test]
fn test_config_invalid_yaml() {
    let err = Config::from_yaml("server: [not, a, map]").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_config_rejects_shared_address() {
    let mut cfg = Config::default();
    cfg.admin.listen_addr = cfg.server.listen_addr.clone();

    assert!(matches!(cfg.validate(), Err(ConfigError::SharedAddress(_))));
}

#[test]
fn test_config_allows_shared_ephemeral_port() {
    let mut cfg = Config::default();
    cfg.server.listen_addr = "127.0.0.1:0".to_string();
    cfg.admin.listen_addr = "127.0.0.1:0".to_string();

    assert!(cfg.validate().is_ok());
}

#[test]
fn test_config_rejects_zero_connections() {
    let mut cfg = Config::default();
    cfg.server.max_connections = 0;

    assert!(matches!(cfg.validate(), Err(ConfigError::NoConnections)));
}

#[test]
fn test_config_read_limits() {
    let mut cfg = Config::default();
    cfg.server.read_timeout_ms = 1500;
    cfg.server.idle_grace_ms = 20;
    cfg.server.max_message_size = 4096;

    let limits = cfg.server.read_limits();
    assert_eq!(limits.read_timeout, Duration::from_millis(1500));
    assert_eq!(limits.idle_grace, Duration::from_millis(20));
    assert_eq!(limits.max_message_size, 4096);
}

#[test]
fn test_config_missing_file() {
    let err = Config::from_file(std::path::Path::new("/nonexistent/wicket.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

// Environment overrides live in one test so parallel tests never race on
// the process environment.
#[test]
fn test_config_env_overrides() {
    unsafe {
        std::env::remove_var("WICKET_CONFIG");
        std::env::set_var("LISTEN", "0.0.0.0:3000");
        std::env::set_var("ADMIN_LISTEN", "127.0.0.1:3001");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.server.listen_addr, "0.0.0.0:3000");
    assert_eq!(cfg.admin.listen_addr, "127.0.0.1:3001");

    unsafe {
        std::env::set_var("ADMIN_LISTEN", "0.0.0.0:3000");
    }
    assert!(matches!(Config::load(), Err(ConfigError::SharedAddress(_))));

    unsafe {
        std::env::remove_var("LISTEN");
        std::env::remove_var("ADMIN_LISTEN");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg, Config::default());
}
