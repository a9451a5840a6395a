use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compat::DEFAULT_MIN_SERVER_VERSION;
use crate::replace::ReplaceMode;
use crate::resolver::SubstitutionPolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: HostConfig,
    pub plugin: PluginConfig,
    pub substitution: SubstitutionConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct HostConfig {
    pub url: String,
    pub access_token: SecretString,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PluginConfig {
    pub id: String,
    pub min_server_version: String,
    pub hook_secret: SecretString,
}

#[derive(Clone, Debug)]
pub struct SubstitutionConfig {
    pub literal_match: bool,
    pub notify_on_host_failure: bool,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub host_url: Option<String>,
    pub host_access_token: Option<String>,
    pub hook_secret: Option<String>,
    pub min_server_version: Option<String>,
    pub literal_match: Option<bool>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: HostConfig {
                url: "http://localhost:8065".to_string(),
                access_token: String::new().into(),
                timeout_secs: 10,
            },
            plugin: PluginConfig {
                id: "com.github.resub".to_string(),
                min_server_version: DEFAULT_MIN_SERVER_VERSION.to_string(),
                hook_secret: String::new().into(),
            },
            substitution: SubstitutionConfig { literal_match: true, notify_on_host_failure: false },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8085,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl SubstitutionConfig {
    pub fn policy(&self) -> SubstitutionPolicy {
        SubstitutionPolicy {
            mode: if self.literal_match { ReplaceMode::Literal } else { ReplaceMode::Pattern },
            notify_on_host_failure: self.notify_on_host_failure,
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("resub.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(host) = patch.host {
            if let Some(url) = host.url {
                self.host.url = url;
            }
            if let Some(access_token) = host.access_token {
                self.host.access_token = secret_value(access_token);
            }
            if let Some(timeout_secs) = host.timeout_secs {
                self.host.timeout_secs = timeout_secs;
            }
        }

        if let Some(plugin) = patch.plugin {
            if let Some(id) = plugin.id {
                self.plugin.id = id;
            }
            if let Some(min_server_version) = plugin.min_server_version {
                self.plugin.min_server_version = min_server_version;
            }
            if let Some(hook_secret) = plugin.hook_secret {
                self.plugin.hook_secret = secret_value(hook_secret);
            }
        }

        if let Some(substitution) = patch.substitution {
            if let Some(literal_match) = substitution.literal_match {
                self.substitution.literal_match = literal_match;
            }
            if let Some(notify_on_host_failure) = substitution.notify_on_host_failure {
                self.substitution.notify_on_host_failure = notify_on_host_failure;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("RESUB_HOST_URL") {
            self.host.url = value;
        }
        if let Some(value) = read_env("RESUB_HOST_ACCESS_TOKEN") {
            self.host.access_token = secret_value(value);
        }
        if let Some(value) = read_env("RESUB_HOST_TIMEOUT_SECS") {
            self.host.timeout_secs = parse_u64("RESUB_HOST_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("RESUB_PLUGIN_ID") {
            self.plugin.id = value;
        }
        if let Some(value) = read_env("RESUB_PLUGIN_MIN_SERVER_VERSION") {
            self.plugin.min_server_version = value;
        }
        if let Some(value) = read_env("RESUB_PLUGIN_HOOK_SECRET") {
            self.plugin.hook_secret = secret_value(value);
        }

        if let Some(value) = read_env("RESUB_SUBSTITUTION_LITERAL_MATCH") {
            self.substitution.literal_match =
                parse_bool("RESUB_SUBSTITUTION_LITERAL_MATCH", &value)?;
        }
        if let Some(value) = read_env("RESUB_SUBSTITUTION_NOTIFY_ON_HOST_FAILURE") {
            self.substitution.notify_on_host_failure =
                parse_bool("RESUB_SUBSTITUTION_NOTIFY_ON_HOST_FAILURE", &value)?;
        }

        if let Some(value) = read_env("RESUB_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("RESUB_SERVER_PORT") {
            self.server.port = parse_u16("RESUB_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("RESUB_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("RESUB_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("RESUB_LOGGING_LEVEL").or_else(|| read_env("RESUB_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("RESUB_LOGGING_FORMAT").or_else(|| read_env("RESUB_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(host_url) = overrides.host_url {
            self.host.url = host_url;
        }
        if let Some(host_access_token) = overrides.host_access_token {
            self.host.access_token = secret_value(host_access_token);
        }
        if let Some(hook_secret) = overrides.hook_secret {
            self.plugin.hook_secret = secret_value(hook_secret);
        }
        if let Some(min_server_version) = overrides.min_server_version {
            self.plugin.min_server_version = min_server_version;
        }
        if let Some(literal_match) = overrides.literal_match {
            self.substitution.literal_match = literal_match;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_host(&self.host)?;
        validate_plugin(&self.plugin)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("resub.toml"), PathBuf::from("config/resub.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_host(host: &HostConfig) -> Result<(), ConfigError> {
    let url = host.url.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "host.url must start with http:// or https://".to_string(),
        ));
    }

    if host.access_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "host.access_token is required. Create a bot account or personal access token under System Console > Integrations".to_string(),
        ));
    }

    if host.timeout_secs == 0 || host.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "host.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_plugin(plugin: &PluginConfig) -> Result<(), ConfigError> {
    if plugin.id.trim().is_empty() {
        return Err(ConfigError::Validation("plugin.id must not be empty".to_string()));
    }

    if semver::Version::parse(plugin.min_server_version.trim()).is_err() {
        return Err(ConfigError::Validation(format!(
            "plugin.min_server_version `{}` is not a semantic version (expected e.g. 5.10.0)",
            plugin.min_server_version
        )));
    }

    if plugin.hook_secret.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "plugin.hook_secret is required so the host can authenticate hook calls".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    host: Option<HostPatch>,
    plugin: Option<PluginPatch>,
    substitution: Option<SubstitutionPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct HostPatch {
    url: Option<String>,
    access_token: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PluginPatch {
    id: Option<String>,
    min_server_version: Option<String>,
    hook_secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SubstitutionPatch {
    literal_match: Option<bool>,
    notify_on_host_failure: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::replace::ReplaceMode;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    const REQUIRED: [&str; 2] = ["RESUB_HOST_ACCESS_TOKEN", "RESUB_PLUGIN_HOOK_SECRET"];

    fn set_required() {
        env::set_var("RESUB_HOST_ACCESS_TOKEN", "token-from-env");
        env::set_var("RESUB_PLUGIN_HOOK_SECRET", "hook-from-env");
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_RESUB_TOKEN", "token-from-interpolation");
        env::set_var("TEST_RESUB_HOOK", "hook-from-interpolation");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("resub.toml");
            fs::write(
                &path,
                r#"
[host]
access_token = "${TEST_RESUB_TOKEN}"

[plugin]
hook_secret = "${TEST_RESUB_HOOK}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.host.access_token.expose_secret() == "token-from-interpolation",
                "access token should be interpolated from the environment",
            )?;
            ensure(
                config.plugin.hook_secret.expose_secret() == "hook-from-interpolation",
                "hook secret should be interpolated from the environment",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_RESUB_TOKEN", "TEST_RESUB_HOOK"]);
        result
    }

    #[test]
    fn defaults_match_literal_and_keep_host_failures_silent() -> Result<(), String> {
        let policy = AppConfig::default().substitution.policy();
        ensure(policy.mode == ReplaceMode::Literal, "literal matching should be the default")?;
        ensure(!policy.notify_on_host_failure, "host failures should be silent by default")
    }

    #[test]
    fn unterminated_interpolation_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("resub.toml");
        fs::write(&path, "[host]\naccess_token = \"${NEVER_CLOSED\"\n")
            .map_err(|err| err.to_string())?;

        let error = AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            .err();
        ensure(
            matches!(error, Some(ConfigError::UnterminatedInterpolation)),
            "unterminated interpolation should fail",
        )
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_required();
        env::set_var("RESUB_HOST_URL", "https://from-env.example.com");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("resub.toml");
            fs::write(
                &path,
                r#"
[host]
url = "https://from-file.example.com"
access_token = "token-from-file"

[server]
port = 9000

[substitution]
literal_match = false

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.host.url == "https://from-env.example.com", "env url should win")?;
            ensure(
                config.host.access_token.expose_secret() == "token-from-env",
                "env token should win over file",
            )?;
            ensure(config.server.port == 9000, "file port should win over default")?;
            ensure(config.logging.level == "debug", "override log level should win")?;
            ensure(
                config.substitution.policy().mode == ReplaceMode::Pattern,
                "file should switch to pattern matching",
            )?;
            Ok(())
        })();

        clear_vars(&REQUIRED);
        clear_vars(&["RESUB_HOST_URL"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_required();
        env::set_var("RESUB_LOG_LEVEL", "warn");
        env::set_var("RESUB_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "log level should be set from alias")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from alias",
            )?;
            Ok(())
        })();

        clear_vars(&REQUIRED);
        clear_vars(&["RESUB_LOG_LEVEL", "RESUB_LOG_FORMAT"]);
        result
    }

    #[test]
    fn validation_requires_access_token() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("RESUB_PLUGIN_HOOK_SECRET", "hook");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::Validation(ref message) if message.contains("host.access_token")
                ),
                "validation failure should mention host.access_token",
            )
        })();

        clear_vars(&REQUIRED);
        result
    }

    #[test]
    fn validation_rejects_non_semver_minimum() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_required();
        env::set_var("RESUB_PLUGIN_MIN_SERVER_VERSION", "five");

        let result = (|| -> Result<(), String> {
            let error = AppConfig::load(LoadOptions::default()).err();
            ensure(
                matches!(
                    error,
                    Some(ConfigError::Validation(ref message)) if message.contains("min_server_version")
                ),
                "validation failure should mention min_server_version",
            )
        })();

        clear_vars(&REQUIRED);
        clear_vars(&["RESUB_PLUGIN_MIN_SERVER_VERSION"]);
        result
    }

    #[test]
    fn invalid_bool_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_required();
        env::set_var("RESUB_SUBSTITUTION_LITERAL_MATCH", "sometimes");

        let result = (|| -> Result<(), String> {
            let error = AppConfig::load(LoadOptions::default()).err();
            ensure(
                matches!(
                    error,
                    Some(ConfigError::InvalidEnvOverride { ref key, .. })
                        if key == "RESUB_SUBSTITUTION_LITERAL_MATCH"
                ),
                "invalid bool should name the variable",
            )
        })();

        clear_vars(&REQUIRED);
        clear_vars(&["RESUB_SUBSTITUTION_LITERAL_MATCH"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("RESUB_HOST_ACCESS_TOKEN", "token-secret-value");
        env::set_var("RESUB_PLUGIN_HOOK_SECRET", "hook-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("token-secret-value"), "debug should not contain token")?;
            ensure(!debug.contains("hook-secret-value"), "debug should not contain hook secret")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            ensure(
                config.substitution.policy().mode == ReplaceMode::Literal,
                "literal matching should be the default",
            )?;
            Ok(())
        })();

        clear_vars(&REQUIRED);
        result
    }
}
