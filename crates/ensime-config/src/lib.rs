//! Generator settings and logging setup.
//!
//! Settings are layered: defaults, then `<root>/.ensime.toml`, then `ENSIME_*`
//! environment variables, then whatever the CLI applies on top.

use std::path::{Path, PathBuf};
use std::sync::Once;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Optional per-project settings file, relative to the project root.
pub const SETTINGS_FILE_NAME: &str = ".ensime.toml";

pub const DEFAULT_SERVER_VERSION: &str = "2.0.0-M4";

/// Scala version used when the build gives no signal at all.
pub const DEFAULT_SCALA_VERSION: &str = "2.10.6";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSettings {
    /// ENSIME server release whose jars are resolved.
    #[serde(default = "GeneratorSettings::default_server_version")]
    pub server_version: String,

    /// Forces the Scala version instead of inferring it from dependencies.
    #[serde(default)]
    pub scala_version: Option<String>,

    #[serde(default = "GeneratorSettings::default_scala_version")]
    pub default_scala_version: String,

    /// Skip generation entirely.
    #[serde(default)]
    pub skip: bool,

    /// Maven local repository; defaults to `~/.m2/repository`.
    #[serde(default)]
    pub maven_repo: Option<PathBuf>,

    /// JVM flags the server is started with, before stack-size normalization.
    #[serde(default)]
    pub java_flags: Vec<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GeneratorSettings {
    fn default_server_version() -> String {
        DEFAULT_SERVER_VERSION.to_owned()
    }

    fn default_scala_version() -> String {
        DEFAULT_SCALA_VERSION.to_owned()
    }

    /// Reads `<root>/.ensime.toml` when it exists, defaults otherwise.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(SETTINGS_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_toml_str(&text, &path)
    }

    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `ENSIME_*` overrides from the process environment.
    pub fn with_process_env(self) -> Self {
        self.with_env(|key| std::env::var(key).ok())
    }

    /// Applies `ENSIME_SCALA_VERSION`, `ENSIME_SERVER_VERSION`, `ENSIME_SKIP`
    /// and `ENSIME_JAVA_FLAGS` as returned by `lookup`. Blank values are ignored.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get("ENSIME_SCALA_VERSION") {
            self.scala_version = Some(v);
        }
        if let Some(v) = get("ENSIME_SERVER_VERSION") {
            self.server_version = v;
        }
        if let Some(v) = get("ENSIME_SKIP") {
            self.skip = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(v) = get("ENSIME_JAVA_FLAGS") {
            self.java_flags = ensime_jdk::split_flags(&v);
        }
        self
    }

    /// The explicit Scala version override, if any non-blank one is set.
    pub fn scala_version_override(&self) -> Option<&str> {
        self.scala_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            server_version: Self::default_server_version(),
            scala_version: None,
            default_scala_version: Self::default_scala_version(),
            skip: false,
            maven_repo: None,
            java_flags: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Either a plain level (`info`, `debug`, ...) or an `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            // Anything else is treated as an `EnvFilter` directive string.
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// The effective filter: the configured level merged with `RUST_LOG`.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

/// Installs a stderr `tracing` subscriber. Only the first call has an effect.
pub fn init_tracing(config: &LoggingConfig) {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(config.env_filter())
            .with_writer(std::io::stderr)
            .with_target(false);

        // Another subscriber may already be installed (e.g. by a test harness).
        let _ = if config.json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_plugin_defaults() {
        let settings = GeneratorSettings::default();
        assert_eq!(settings.server_version, "2.0.0-M4");
        assert_eq!(settings.default_scala_version, "2.10.6");
        assert_eq!(settings.scala_version_override(), None);
        assert!(!settings.skip);
    }

    #[test]
    fn parses_settings_file() {
        let settings = GeneratorSettings::from_toml_str(
            r#"
scala_version = "2.12.8"
maven_repo = "/opt/m2"
java_flags = ["-Xmx2g"]

[logging]
level = "WARNING"
"#,
            Path::new(".ensime.toml"),
        )
        .unwrap();

        assert_eq!(settings.scala_version_override(), Some("2.12.8"));
        assert_eq!(settings.maven_repo, Some(PathBuf::from("/opt/m2")));
        assert_eq!(settings.java_flags, vec!["-Xmx2g".to_string()]);
        assert_eq!(settings.server_version, DEFAULT_SERVER_VERSION);
        assert_eq!(
            LoggingConfig::normalize_level_directives(&settings.logging.level),
            "warn"
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = GeneratorSettings::from_toml_str("bogus = 1", Path::new("x.toml")).unwrap_err();
        assert!(err.to_string().contains("x.toml"));
    }

    #[test]
    fn environment_overrides_file_values() {
        let env = HashMap::from([
            ("ENSIME_SCALA_VERSION", "2.11.12"),
            ("ENSIME_SKIP", "TRUE"),
            ("ENSIME_JAVA_FLAGS", "-Xss1m -Dx=y"),
            ("ENSIME_SERVER_VERSION", "   "),
        ]);
        let settings = GeneratorSettings::default()
            .with_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.scala_version_override(), Some("2.11.12"));
        assert!(settings.skip);
        assert_eq!(settings.java_flags, vec!["-Xss1m", "-Dx=y"]);
        assert_eq!(settings.server_version, DEFAULT_SERVER_VERSION);
    }

    #[test]
    fn blank_override_is_not_an_override() {
        let settings = GeneratorSettings {
            scala_version: Some("  ".to_string()),
            ..GeneratorSettings::default()
        };
        assert_eq!(settings.scala_version_override(), None);
    }

    #[test]
    fn missing_settings_file_yields_defaults() {
        let temp = tempfile::tempdir().unwrap();
        assert_eq!(
            GeneratorSettings::load(temp.path()).unwrap(),
            GeneratorSettings::default()
        );
    }
}
