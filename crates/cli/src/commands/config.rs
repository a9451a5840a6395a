use std::env;
use std::fs;
use std::path::Path;

use resub_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let sources = Sources {
        doc: load_config_file_doc(config_file_path.as_deref()),
        path: config_file_path.as_deref(),
    };

    let entries = [
        ("host.url", "RESUB_HOST_URL", config.host.url.clone()),
        ("host.access_token", "RESUB_HOST_ACCESS_TOKEN", redact(&config.host.access_token)),
        ("host.timeout_secs", "RESUB_HOST_TIMEOUT_SECS", config.host.timeout_secs.to_string()),
        ("plugin.id", "RESUB_PLUGIN_ID", config.plugin.id.clone()),
        (
            "plugin.min_server_version",
            "RESUB_PLUGIN_MIN_SERVER_VERSION",
            config.plugin.min_server_version.clone(),
        ),
        ("plugin.hook_secret", "RESUB_PLUGIN_HOOK_SECRET", redact(&config.plugin.hook_secret)),
        (
            "substitution.literal_match",
            "RESUB_SUBSTITUTION_LITERAL_MATCH",
            config.substitution.literal_match.to_string(),
        ),
        (
            "substitution.notify_on_host_failure",
            "RESUB_SUBSTITUTION_NOTIFY_ON_HOST_FAILURE",
            config.substitution.notify_on_host_failure.to_string(),
        ),
        ("server.bind_address", "RESUB_SERVER_BIND_ADDRESS", config.server.bind_address.clone()),
        ("server.port", "RESUB_SERVER_PORT", config.server.port.to_string()),
        (
            "server.graceful_shutdown_secs",
            "RESUB_SERVER_GRACEFUL_SHUTDOWN_SECS",
            config.server.graceful_shutdown_secs.to_string(),
        ),
        ("logging.level", "RESUB_LOGGING_LEVEL", config.logging.level.clone()),
        ("logging.format", "RESUB_LOGGING_FORMAT", format!("{:?}", config.logging.format)),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, env_key, value) in entries {
        lines.push(render_line(key, &value, sources.field_source(key, env_key)));
    }

    lines.join("\n")
}

struct Sources<'a> {
    doc: Option<Value>,
    path: Option<&'a Path>,
}

impl Sources<'_> {
    fn field_source(&self, key_path: &str, env_key: &str) -> String {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact(secret: &SecretString) -> String {
    if secret.expose_secret().trim().is_empty() {
        return "<empty>".to_string();
    }
    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use toml::Value;

    use super::{contains_path, redact};

    #[test]
    fn secrets_are_never_printed() {
        assert_eq!(redact(&SecretString::from("abc123".to_string())), "<redacted>");
        assert_eq!(redact(&SecretString::from("  ".to_string())), "<empty>");
    }

    #[test]
    fn nested_keys_are_found_in_the_file() {
        let doc: Value = "[host]\nurl = \"http://chat\"\n".parse().expect("toml");
        assert!(contains_path(&doc, "host.url"));
        assert!(!contains_path(&doc, "host.timeout_secs"));
        assert!(!contains_path(&doc, "plugin.id"));
    }
}
