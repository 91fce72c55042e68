// ABOUTME: Integration tests for config.yml parsing, discovery, and token resolution.
// ABOUTME: Environment-dependent cases run under temp-env so they do not leak.

use edgeship::config::*;
use edgeship::error::Error;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.api.endpoint, DEFAULT_API_ENDPOINT);
        assert!(config.api.token.is_none());
        assert!(config.build.timeout.is_none());
        assert_eq!(config.language.rust.wasm_target, "wasm32-wasip1");
        assert_eq!(config.language.rust.toolchain_constraint, ">=1.78.0");
        assert_eq!(config.language.go.tinygo_constraint, ">=0.28.1");
        assert_eq!(config.status_check.timeout, Duration::from_secs(120));
        assert_eq!(config.status_check.path, "/");
    }

    #[test]
    fn full_config() {
        let yaml = r#"
api:
  endpoint: https://api.example.test
  token:
    env: EDGE_TOKEN
    default: fallback
build:
  timeout: 5m
language:
  rust:
    toolchain_constraint: ">=1.80.0"
    wasm_target: wasm32-wasi
  go:
    toolchain_constraint: ">=1.22"
status_check:
  timeout: 30s
  path: /health
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.api.endpoint, "https://api.example.test");
        assert_eq!(config.build.timeout, Some(Duration::from_secs(300)));
        assert_eq!(config.language.rust.wasm_target, "wasm32-wasi");
        assert_eq!(config.language.go.toolchain_constraint, ">=1.22");
        assert_eq!(config.language.go.tinygo_constraint, ">=0.28.1");
        assert_eq!(config.status_check.timeout, Duration::from_secs(30));
        assert_eq!(config.status_check.path, "/health");
        assert!(matches!(
            config.api.token,
            Some(EnvValue::FromEnv { ref var, .. }) if var == "EDGE_TOKEN"
        ));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = Config::from_yaml("api: [unclosed").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
        assert!(err.remediation().is_some());
    }
}

mod discovery {
    use super::*;

    #[test]
    fn explicit_path_must_exist() {
        temp_env::with_var(CONFIG_PATH_ENV, Some("/nonexistent/edgeship.yml"), || {
            let err = Config::discover().unwrap_err();
            assert!(matches!(err, Error::ConfigNotFound(_)));
        });
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yml");
        std::fs::write(&path, "status_check:\n  path: /ready\n").unwrap();

        temp_env::with_var(CONFIG_PATH_ENV, Some(&path), || {
            let config = Config::discover().unwrap();
            assert_eq!(config.status_check.path, "/ready");
        });
    }

    #[test]
    fn xdg_config_home_is_searched() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("edgeship");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join(CONFIG_FILENAME),
            "api:\n  endpoint: https://xdg.example.test\n",
        )
        .unwrap();

        temp_env::with_vars(
            [
                (CONFIG_PATH_ENV, None),
                ("XDG_CONFIG_HOME", Some(dir.path().as_os_str())),
            ],
            || {
                let config = Config::discover().unwrap();
                assert_eq!(config.api.endpoint, "https://xdg.example.test");
            },
        );
    }

    #[test]
    fn absent_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        temp_env::with_vars(
            [
                (CONFIG_PATH_ENV, None),
                ("XDG_CONFIG_HOME", Some(dir.path().as_os_str())),
            ],
            || {
                let config = Config::discover().unwrap();
                assert_eq!(config.api.endpoint, DEFAULT_API_ENDPOINT);
            },
        );
    }
}

mod token {
    use super::*;

    fn with_literal(token: &str) -> Config {
        Config::from_yaml(&format!("api:\n  token: {token}\n")).unwrap()
    }

    #[test]
    fn flag_wins() {
        temp_env::with_var(TOKEN_ENV, Some("from-env"), || {
            let token = with_literal("from-config").resolve_token(Some("from-flag"));
            assert_eq!(token.unwrap().as_str(), "from-flag");
        });
    }

    #[test]
    fn env_beats_config() {
        temp_env::with_var(TOKEN_ENV, Some("from-env"), || {
            let token = with_literal("from-config").resolve_token(None);
            assert_eq!(token.unwrap().as_str(), "from-env");
        });
    }

    #[test]
    fn config_is_last_resort() {
        temp_env::with_var_unset(TOKEN_ENV, || {
            let token = with_literal("from-config").resolve_token(Some("  "));
            assert_eq!(token.unwrap().as_str(), "from-config");
        });
    }

    #[test]
    fn nothing_configured_is_none() {
        temp_env::with_var_unset(TOKEN_ENV, || {
            assert!(Config::default().resolve_token(None).is_none());
        });
    }
}
