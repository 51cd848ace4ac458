use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::Url;

/// Environment variable naming the log destination
pub const LOG_PATH_ENV: &str = "COLLIE_LSP_LOG";

/// Environment variable naming the grammar engine command
pub const ENGINE_COMMAND_ENV: &str = "COLLIE_ENGINE";

/// Grammar engine command used when nothing else is configured
pub const DEFAULT_ENGINE_COMMAND: &str = "collie";

/// Per-workspace grammar engine configuration file
pub const CONFIG_FILE_NAME: &str = ".collie.yml";

/// Filename passed to the engine when a URI has no usable path
pub const FALLBACK_FILENAME: &str = "grammar.y";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Append internal failures here; `None` keeps the server silent
    pub log_path: Option<PathBuf>,
    pub engine_command: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            engine_command: DEFAULT_ENGINE_COMMAND.to_string(),
        }
    }
}

impl ServerConfig {
    /// Resolves the configuration. Command line values win over the environment.
    pub fn resolve(log_path: Option<PathBuf>, engine_command: Option<String>) -> Self {
        resolve_with_env(
            log_path,
            engine_command,
            std::env::var(LOG_PATH_ENV).ok(),
            std::env::var(ENGINE_COMMAND_ENV).ok(),
        )
    }
}

fn resolve_with_env(
    log_path: Option<PathBuf>,
    engine_command: Option<String>,
    env_log_path: Option<String>,
    env_engine_command: Option<String>,
) -> ServerConfig {
    let log_path = log_path.or_else(|| {
        env_log_path
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    });

    let engine_command = engine_command
        .or(env_engine_command)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENGINE_COMMAND.to_string());

    ServerConfig {
        log_path,
        engine_command,
    }
}

/// Returns `<root>/.collie.yml` if it exists.
pub fn find_config(root: &Path) -> Option<PathBuf> {
    let path = root.join(CONFIG_FILE_NAME);
    path.is_file().then_some(path)
}

/// Filename handed to the engine for a document URI.
/// `file://` URIs map to their path; anything else keeps the URI path component.
pub fn uri_to_filename(uri: &Url) -> String {
    if let Ok(path) = uri.to_file_path() {
        return path.to_string_lossy().into_owned();
    }

    let path = uri.path();
    if path.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn resolve_with_env_prefers_command_line_values() {
        let config = resolve_with_env(
            Some(PathBuf::from("/tmp/cli.log")),
            Some("bundle exec collie".to_string()),
            Some("/tmp/env.log".to_string()),
            Some("env-collie".to_string()),
        );

        assert_eq!(config.log_path, Some(PathBuf::from("/tmp/cli.log")));
        assert_eq!(config.engine_command, "bundle exec collie");
    }

    #[test]
    fn resolve_with_env_falls_back_to_environment() {
        let config = resolve_with_env(
            None,
            None,
            Some("/tmp/env.log".to_string()),
            Some("env-collie".to_string()),
        );

        assert_eq!(config.log_path, Some(PathBuf::from("/tmp/env.log")));
        assert_eq!(config.engine_command, "env-collie");
    }

    #[test]
    fn resolve_with_env_uses_defaults_when_nothing_is_set() {
        let config = resolve_with_env(None, None, None, Some("  ".to_string()));
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    #[serial]
    fn resolve_reads_log_path_from_environment() {
        // SAFETY: serialized with every other test touching the process environment
        unsafe {
            std::env::set_var(LOG_PATH_ENV, "/tmp/collie-lsp-test.log");
            std::env::remove_var(ENGINE_COMMAND_ENV);
        }

        let config = ServerConfig::resolve(None, None);

        unsafe {
            std::env::remove_var(LOG_PATH_ENV);
        }
        assert_eq!(
            config.log_path,
            Some(PathBuf::from("/tmp/collie-lsp-test.log"))
        );
        assert_eq!(config.engine_command, DEFAULT_ENGINE_COMMAND);
    }

    #[test]
    #[serial]
    fn resolve_leaves_log_path_unset_without_environment() {
        unsafe {
            std::env::remove_var(LOG_PATH_ENV);
        }

        let config = ServerConfig::resolve(None, None);

        assert!(config.log_path.is_none());
    }

    #[test]
    fn find_config_returns_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "").unwrap();

        assert_eq!(
            find_config(temp_dir.path()),
            Some(temp_dir.path().join(CONFIG_FILE_NAME))
        );
    }

    #[test]
    fn find_config_returns_none_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(find_config(temp_dir.path()), None);
    }

    #[cfg(unix)]
    #[test]
    fn uri_to_filename_strips_file_scheme() {
        let uri = Url::parse("file:///workspace/grammar/calc.y").unwrap();
        assert_eq!(uri_to_filename(&uri), "/workspace/grammar/calc.y");
    }

    #[test]
    fn uri_to_filename_keeps_path_of_other_schemes() {
        let uri = Url::parse("untitled:Untitled-1").unwrap();
        assert_eq!(uri_to_filename(&uri), "Untitled-1");
    }
}
