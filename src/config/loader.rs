//! Configuration loading: defaults, optional TOML file, environment overlay.

use std::fs;
use std::path::Path;

use crate::config::env::apply_env;
use crate::config::schema::Settings;
use crate::config::validation::{validate_settings, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {message}")]
    Env { var: &'static str, message: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build settings from the process environment.
///
/// Defaults, then the TOML file when given, then environment variables.
/// Validation runs once on the merged result.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    load_settings_with(path, |name| std::env::var(name).ok())
}

/// Same as [`load_settings`] but resolves variables through `lookup`.
pub fn load_settings_with<F>(path: Option<&Path>, lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = match path {
        Some(path) => toml::from_str::<Settings>(&fs::read_to_string(path)?)?,
        None => Settings::default(),
    };

    apply_env(&mut settings, lookup)?;
    validate_settings(&settings).map_err(ConfigError::Validation)?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn load_file(path: &Path) -> Result<Settings, ConfigError> {
        load_settings_with(Some(path), |_| None)
    }

    fn temp_file(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("fallback-cors-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_file() {
        let path = temp_file(
            r#"
            [listener]
            bind_address = "127.0.0.1:8123"

            [cors]
            fallback_enabled = true
            "#,
        );

        let settings = load_file(&path).unwrap();
        assert_eq!(settings.listener.bind_address, "127.0.0.1:8123");
        assert!(settings.cors.fallback_enabled);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_load_file_reports_parse_error() {
        let path = temp_file("[cors\nallow_all_origins = true");
        assert!(matches!(load_file(&path), Err(ConfigError::Parse(_))));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_load_file_reports_validation_errors() {
        let path = temp_file(
            r#"
            [listener]
            bind_address = "not-an-address"
            request_timeout_secs = 0
            "#,
        );

        match load_file(&path) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {:?}", other),
        }
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_env_overrides_file() {
        let path = temp_file(
            r#"
            [security]
            debug = false
            "#,
        );

        let settings = load_settings_with(Some(&path), |name| {
            (name == "DEBUG").then(|| "true".to_string())
        })
        .unwrap();
        assert!(settings.security.debug);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_no_file_uses_defaults() {
        assert_eq!(load_settings_with(None, |_| None).unwrap(), Settings::default());
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("fallback-cors-does-not-exist.toml");
        assert!(matches!(load_file(&path), Err(ConfigError::Io(_))));
    }
}
