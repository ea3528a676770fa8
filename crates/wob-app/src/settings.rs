//! 설정 로드.
//!
//! 우선순위(낮음 → 높음): 기본값 → 설정 파일 → `WOB__*` 환경변수 → CLI 플래그.
//! 설정 파일은 `--config`로 지정하거나 플랫폼 설정 디렉토리의 `wob/config.toml`을 쓴다.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use directories::ProjectDirs;
use tracing::debug;
use wob_core::config::AppConfig;
use wob_core::error::CoreError;

/// 환경변수 접두사 (`WOB__SERVER__ADDRESS` 형식)
pub const ENV_PREFIX: &str = "WOB";

/// CLI에서 덮어쓰는 값
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub address: Option<String>,
    pub secure: Option<bool>,
    pub sample_rate: Option<u32>,
}

/// 기본 설정 파일 경로
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "wob").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// 프로세스 환경변수를 포함해 설정 로드
pub fn load(path: Option<&Path>, overrides: &CliOverrides) -> Result<AppConfig, CoreError> {
    load_with_env(path, overrides, None)
}

/// 설정 로드. `env`가 주어지면 프로세스 환경 대신 그 맵을 읽는다.
pub fn load_with_env(
    path: Option<&Path>,
    overrides: &CliOverrides,
    env: Option<HashMap<String, String>>,
) -> Result<AppConfig, CoreError> {
    let defaults =
        Config::try_from(&AppConfig::default_config()).map_err(|e| config_error("기본값", e))?;

    let mut builder = Config::builder().add_source(defaults);

    match path {
        Some(path) => {
            debug!("설정 파일: {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        None => {
            if let Some(default_path) = default_config_path() {
                debug!("기본 설정 파일 탐색: {}", default_path.display());
                builder = builder.add_source(File::from(default_path).required(false));
            }
        }
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(env),
    );

    builder = builder
        .set_override_option("server.address", overrides.address.clone())
        .map_err(|e| config_error("--address", e))?
        .set_override_option("server.secure", overrides.secure)
        .map_err(|e| config_error("--secure", e))?
        .set_override_option("broadcast.sample_rate", overrides.sample_rate.map(i64::from))
        .map_err(|e| config_error("--sample-rate", e))?;

    let config: AppConfig = builder
        .build()
        .map_err(|e| config_error("병합", e))?
        .try_deserialize()
        .map_err(|e| config_error("역직렬화", e))?;

    config.validate()?;
    Ok(config)
}

fn config_error(stage: &str, e: config::ConfigError) -> CoreError {
    CoreError::Config(format!("설정 로드 실패 ({stage}): {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn explicit_file_required_and_empty_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        // 명시 경로가 없으면 실패해야 한다
        assert_matches!(
            load_with_env(Some(&missing), &CliOverrides::default(), env(&[])),
            Err(CoreError::Config(_))
        );

        let file = toml_file("");
        let config =
            load_with_env(Some(file.path()), &CliOverrides::default(), env(&[])).unwrap();
        assert_eq!(config.broadcast.sample_rate, 30);
        assert!(config.server.address.is_none());
        assert!(config.sensors.touch);
    }

    #[test]
    fn file_values_override_defaults() {
        let file = toml_file(
            r#"
[server]
address = "192.168.1.5:9980"
secure = true

[broadcast]
sample_rate = 60

[reconnect]
max_delay_ms = 5000
"#,
        );
        let config =
            load_with_env(Some(file.path()), &CliOverrides::default(), env(&[])).unwrap();
        assert_eq!(config.server.address.as_deref(), Some("192.168.1.5:9980"));
        assert!(config.server.secure);
        assert_eq!(config.broadcast.sample_rate, 60);
        assert_eq!(config.reconnect.max_delay_ms, 5000);
        assert_eq!(config.reconnect.base_delay_ms, 1000);
    }

    #[test]
    fn env_then_cli_take_precedence() {
        let file = toml_file("[broadcast]\nsample_rate = 60\n");
        let vars = env(&[
            ("WOB__BROADCAST__SAMPLE_RATE", "45"),
            ("WOB__SENSORS__GEOLOCATION", "true"),
        ]);

        let config =
            load_with_env(Some(file.path()), &CliOverrides::default(), vars.clone()).unwrap();
        assert_eq!(config.broadcast.sample_rate, 45);
        assert!(config.sensors.geolocation);

        let overrides = CliOverrides {
            address: Some("td.local:9980".into()),
            secure: None,
            sample_rate: Some(20),
        };
        let config = load_with_env(Some(file.path()), &overrides, vars).unwrap();
        assert_eq!(config.broadcast.sample_rate, 20);
        assert_eq!(config.server.address.as_deref(), Some("td.local:9980"));
        assert!(!config.server.secure);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let file = toml_file("[broadcast]\nsample_rate = 0\n");
        assert_matches!(
            load_with_env(Some(file.path()), &CliOverrides::default(), env(&[])),
            Err(CoreError::Config(_))
        );
    }
}
