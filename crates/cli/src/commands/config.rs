use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use intake_core::config::{
    redact_preview, AppConfig, LoadOptions, ENV_AIRTABLE_API_KEY, ENV_AIRTABLE_API_URL,
    ENV_AIRTABLE_BASE_ID, ENV_AIRTABLE_TABLE, ENV_FROM_EMAIL, ENV_NOTIFY_EMAIL, ENV_NOTIFY_PHONE,
    ENV_RESEND_API_KEY, ENV_RESEND_API_URL, ENV_RESEND_REPLY_TO, ENV_TEXTBELT_API_KEY,
    ENV_TEXTBELT_API_URL,
};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

use super::CommandResult;

const UNSET: &str = "<unset>";

/// One reported setting: dotted key, display value and the env variable
/// that can override it.
struct Entry {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for entry in entries(&config) {
        let source = field_source(
            entry.key,
            entry.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(entry.key, &entry.value, source));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn entries(config: &AppConfig) -> Vec<Entry> {
    let text = |value: &Option<String>| value.clone().unwrap_or_else(|| UNSET.to_string());

    vec![
        Entry {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["INTAKE_SERVER_BIND_ADDRESS"],
        },
        Entry {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["INTAKE_SERVER_PORT"],
        },
        Entry {
            key: "server.debug_endpoint",
            value: config.server.debug_endpoint.to_string(),
            env_keys: &["INTAKE_SERVER_DEBUG_ENDPOINT"],
        },
        Entry {
            key: "airtable.api_key",
            value: redact_secret(config.airtable.api_key.as_ref()),
            env_keys: &[ENV_AIRTABLE_API_KEY],
        },
        Entry {
            key: "airtable.base_id",
            value: text(&config.airtable.base_id),
            env_keys: &[ENV_AIRTABLE_BASE_ID],
        },
        Entry {
            key: "airtable.table",
            value: config.airtable.table.clone(),
            env_keys: &[ENV_AIRTABLE_TABLE],
        },
        Entry {
            key: "airtable.api_url",
            value: config.airtable.api_url.clone(),
            env_keys: &[ENV_AIRTABLE_API_URL],
        },
        Entry {
            key: "textbelt.api_key",
            value: redact_secret(config.textbelt.api_key.as_ref()),
            env_keys: &[ENV_TEXTBELT_API_KEY],
        },
        Entry {
            key: "textbelt.notify_phone",
            value: text(&config.textbelt.notify_phone),
            env_keys: &[ENV_NOTIFY_PHONE],
        },
        Entry {
            key: "textbelt.api_url",
            value: config.textbelt.api_url.clone(),
            env_keys: &[ENV_TEXTBELT_API_URL],
        },
        Entry {
            key: "resend.api_key",
            value: redact_secret(config.resend.api_key.as_ref()),
            env_keys: &[ENV_RESEND_API_KEY],
        },
        Entry {
            key: "resend.from_email",
            value: text(&config.resend.from_email),
            env_keys: &[ENV_FROM_EMAIL],
        },
        Entry {
            key: "resend.notify_email",
            value: text(&config.resend.notify_email),
            env_keys: &[ENV_NOTIFY_EMAIL],
        },
        Entry {
            key: "resend.reply_to",
            value: text(&config.resend.reply_to),
            env_keys: &[ENV_RESEND_REPLY_TO],
        },
        Entry {
            key: "resend.api_url",
            value: config.resend.api_url.clone(),
            env_keys: &[ENV_RESEND_API_URL],
        },
        Entry {
            key: "intake.response_policy",
            value: format!("{:?}", config.intake.response_policy),
            env_keys: &["INTAKE_RESPONSE_POLICY"],
        },
        Entry {
            key: "intake.dispatch_mode",
            value: format!("{:?}", config.intake.dispatch_mode),
            env_keys: &["INTAKE_DISPATCH_MODE"],
        },
        Entry {
            key: "intake.outbound_timeout_secs",
            value: config.intake.outbound_timeout_secs.to_string(),
            env_keys: &["INTAKE_OUTBOUND_TIMEOUT_SECS"],
        },
        Entry {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["INTAKE_LOGGING_LEVEL", "INTAKE_LOG_LEVEL"],
        },
        Entry {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["INTAKE_LOGGING_FORMAT", "INTAKE_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("intake.toml"), PathBuf::from("config/intake.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
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

fn redact_secret(secret: Option<&SecretString>) -> String {
    match secret.map(|secret| secret.expose_secret().trim()) {
        Some(value) if !value.is_empty() => redact_preview(value),
        Some(_) => "<empty>".to_string(),
        None => UNSET.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use toml::Value;

    use super::{contains_path, redact_secret};

    #[test]
    fn secrets_are_redacted_to_a_short_prefix() {
        let secret = SecretString::from("patABCDEFGHIJKLMNOP".to_string());
        assert_eq!(redact_secret(Some(&secret)), "patA***");
        assert_eq!(redact_secret(Some(&SecretString::from("short".to_string()))), "***");
        assert_eq!(redact_secret(Some(&SecretString::from("  ".to_string()))), "<empty>");
        assert_eq!(redact_secret(None), "<unset>");
    }

    #[test]
    fn dotted_paths_are_found_in_config_documents() {
        let doc: Value = "[airtable]\nbase_id = \"app1\"\n".parse().expect("toml");
        assert!(contains_path(&doc, "airtable.base_id"));
        assert!(!contains_path(&doc, "airtable.table"));
        assert!(!contains_path(&doc, "resend.api_key"));
    }
}
