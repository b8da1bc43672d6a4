// In crates/app-config/src/lib.rs

use config::{Config, Environment, File};
use std::path::Path;

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{
    BridgeSettings, ClassifierSettings, DatabaseSettings, EvaluationSettings, ServerSettings,
    Settings, StoreBackend,
};

/// Loads the application settings from the `config/` directory of the working directory.
pub fn load_settings() -> Result<Settings> {
    load_settings_from("config")
}

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
pub fn load_settings_from(dir: impl AsRef<Path>) -> Result<Settings> {
    let dir = dir.as_ref();
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let settings = Config::builder()
        .add_source(File::with_name(&dir.join("base").to_string_lossy()))
        .add_source(File::with_name(&dir.join(&environment).to_string_lossy()).required(false))
        // e.g. `APP_DATABASE__URL=...`: prefix `APP`, separator `__`.
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let mut settings: Settings = settings.try_deserialize()?;

    let vocabulary = dir.join("vocabulary.toml");
    if vocabulary.exists() {
        extend_vocabulary(&mut settings.classifier, &vocabulary)?;
    }

    Ok(settings)
}

/// Appends the excluded type markers listed in a standalone vocabulary file.
///
/// Lets operators teach the classifier a new broker's ledger vocabulary without
/// touching the main settings files.
pub fn extend_vocabulary(classifier: &mut ClassifierSettings, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    let file: types::VocabularyFile = toml::from_str(&content)?;

    for marker in file.excluded_types {
        let marker = marker.trim().to_ascii_uppercase();
        if !marker.is_empty() && !classifier.excluded_types.contains(&marker) {
            classifier.excluded_types.push(marker);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn vocabulary_file_extends_defaults_without_duplicates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "excluded_types = [\"balance\", \"DEPOSIT\", \" rebate \"]").unwrap();

        let mut classifier = ClassifierSettings::default();
        let before = classifier.excluded_types.len();
        extend_vocabulary(&mut classifier, file.path()).unwrap();

        assert_eq!(classifier.excluded_types.len(), before + 2);
        assert!(classifier.excluded_types.contains(&"DEPOSIT".to_string()));
        assert!(classifier.excluded_types.contains(&"REBATE".to_string()));
    }

    #[test]
    fn settings_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("base.toml"),
            r#"
            [app]
            environment = "test"
            log_level = "debug"

            [server]
            host = "127.0.0.1"
            port = 9000

            [bridge]
            base_url = "http://localhost:1234"

            [database]
            backend = "memory"
            "#,
        )
        .unwrap();

        let settings = load_settings_from(dir.path()).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.database.backend, StoreBackend::Memory);
        assert_eq!(settings.bridge.connect_timeout_secs, 20);
        assert_eq!(settings.evaluation.recent_trades_limit, 50);
        assert!(settings.classifier.excluded_types.contains(&"BALANCE".to_string()));
    }
}
