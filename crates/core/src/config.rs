use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::Collaborator;

pub const ENV_AIRTABLE_API_KEY: &str = "INTAKE_AIRTABLE_API_KEY";
pub const ENV_AIRTABLE_BASE_ID: &str = "INTAKE_AIRTABLE_BASE_ID";
pub const ENV_AIRTABLE_TABLE: &str = "INTAKE_AIRTABLE_TABLE";
pub const ENV_AIRTABLE_API_URL: &str = "INTAKE_AIRTABLE_API_URL";
pub const ENV_TEXTBELT_API_KEY: &str = "INTAKE_TEXTBELT_API_KEY";
pub const ENV_NOTIFY_PHONE: &str = "INTAKE_NOTIFY_PHONE";
pub const ENV_TEXTBELT_API_URL: &str = "INTAKE_TEXTBELT_API_URL";
pub const ENV_RESEND_API_KEY: &str = "INTAKE_RESEND_API_KEY";
pub const ENV_NOTIFY_EMAIL: &str = "INTAKE_NOTIFY_EMAIL";
pub const ENV_FROM_EMAIL: &str = "INTAKE_FROM_EMAIL";
pub const ENV_RESEND_REPLY_TO: &str = "INTAKE_RESEND_REPLY_TO";
pub const ENV_RESEND_API_URL: &str = "INTAKE_RESEND_API_URL";

/// Variables reported by the diagnostic endpoint, in display order.
pub const DIAGNOSTIC_VARIABLES: [&str; 8] = [
    ENV_AIRTABLE_API_KEY,
    ENV_AIRTABLE_BASE_ID,
    ENV_AIRTABLE_TABLE,
    ENV_TEXTBELT_API_KEY,
    ENV_NOTIFY_PHONE,
    ENV_RESEND_API_KEY,
    ENV_NOTIFY_EMAIL,
    ENV_FROM_EMAIL,
];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub airtable: AirtableConfig,
    pub textbelt: TextbeltConfig,
    pub resend: ResendConfig,
    pub intake: IntakeConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub debug_endpoint: bool,
}

#[derive(Clone, Debug)]
pub struct AirtableConfig {
    pub api_key: Option<SecretString>,
    pub base_id: Option<String>,
    pub table: String,
    pub api_url: String,
}

#[derive(Clone, Debug)]
pub struct TextbeltConfig {
    pub api_key: Option<SecretString>,
    pub notify_phone: Option<String>,
    pub api_url: String,
}

#[derive(Clone, Debug)]
pub struct ResendConfig {
    pub api_key: Option<SecretString>,
    pub from_email: Option<String>,
    pub notify_email: Option<String>,
    /// Optional reply-to address; omitted from the send body when unset.
    pub reply_to: Option<String>,
    pub api_url: String,
}

#[derive(Clone, Debug)]
pub struct IntakeConfig {
    pub response_policy: ResponsePolicy,
    pub dispatch_mode: DispatchMode,
    pub outbound_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// What the submitter is told after the fan-out settles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePolicy {
    /// Always `{success: true}`; collaborator failures are only logged.
    Silent,
    /// `{success: true}` plus a per-collaborator outcome summary.
    Diagnostic,
}

/// Ordering of the three collaborator calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// All three calls run concurrently.
    Concurrent,
    /// Record store first, then SMS and email concurrently with the record link.
    RecordFirst,
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
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub debug_endpoint: Option<bool>,
    pub log_level: Option<String>,
    pub response_policy: Option<ResponsePolicy>,
    pub dispatch_mode: Option<DispatchMode>,
    pub airtable_api_key: Option<String>,
    pub airtable_base_id: Option<String>,
    pub airtable_api_url: Option<String>,
    pub textbelt_api_key: Option<String>,
    pub notify_phone: Option<String>,
    pub textbelt_api_url: Option<String>,
    pub resend_api_key: Option<String>,
    pub from_email: Option<String>,
    pub notify_email: Option<String>,
    pub reply_to: Option<String>,
    pub resend_api_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    /// Skip `INTAKE_*` environment overrides. Used by tests that build a
    /// config purely from overrides.
    pub ignore_env: bool,
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
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                debug_endpoint: false,
            },
            airtable: AirtableConfig {
                api_key: None,
                base_id: None,
                table: "Quotes".to_string(),
                api_url: "https://api.airtable.com".to_string(),
            },
            textbelt: TextbeltConfig {
                api_key: None,
                notify_phone: None,
                api_url: "https://textbelt.com".to_string(),
            },
            resend: ResendConfig {
                api_key: None,
                from_email: None,
                notify_email: None,
                reply_to: None,
                api_url: "https://api.resend.com".to_string(),
            },
            intake: IntakeConfig {
                response_policy: ResponsePolicy::Silent,
                dispatch_mode: DispatchMode::Concurrent,
                outbound_timeout_secs: 10,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for ResponsePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "silent" => Ok(Self::Silent),
            "diagnostic" => Ok(Self::Diagnostic),
            other => Err(ConfigError::Validation(format!(
                "unsupported response policy `{other}` (expected silent|diagnostic)"
            ))),
        }
    }
}

impl std::str::FromStr for DispatchMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "concurrent" => Ok(Self::Concurrent),
            "record_first" => Ok(Self::RecordFirst),
            other => Err(ConfigError::Validation(format!(
                "unsupported dispatch mode `{other}` (expected concurrent|record_first)"
            ))),
        }
    }
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

/// One named configuration variable, as reported by diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VariableReport {
    pub name: &'static str,
    pub present: bool,
    pub preview: Option<String>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("intake.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        if !options.ignore_env {
            config.apply_env_overrides()?;
        }
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(debug_endpoint) = server.debug_endpoint {
                self.server.debug_endpoint = debug_endpoint;
            }
        }

        if let Some(airtable) = patch.airtable {
            if let Some(api_key) = airtable.api_key {
                self.airtable.api_key = Some(secret_value(api_key));
            }
            if let Some(base_id) = airtable.base_id {
                self.airtable.base_id = Some(base_id);
            }
            if let Some(table) = airtable.table {
                self.airtable.table = table;
            }
            if let Some(api_url) = airtable.api_url {
                self.airtable.api_url = api_url;
            }
        }

        if let Some(textbelt) = patch.textbelt {
            if let Some(api_key) = textbelt.api_key {
                self.textbelt.api_key = Some(secret_value(api_key));
            }
            if let Some(notify_phone) = textbelt.notify_phone {
                self.textbelt.notify_phone = Some(notify_phone);
            }
            if let Some(api_url) = textbelt.api_url {
                self.textbelt.api_url = api_url;
            }
        }

        if let Some(resend) = patch.resend {
            if let Some(api_key) = resend.api_key {
                self.resend.api_key = Some(secret_value(api_key));
            }
            if let Some(from_email) = resend.from_email {
                self.resend.from_email = Some(from_email);
            }
            if let Some(notify_email) = resend.notify_email {
                self.resend.notify_email = Some(notify_email);
            }
            if let Some(reply_to) = resend.reply_to {
                self.resend.reply_to = Some(reply_to);
            }
            if let Some(api_url) = resend.api_url {
                self.resend.api_url = api_url;
            }
        }

        if let Some(intake) = patch.intake {
            if let Some(response_policy) = intake.response_policy {
                self.intake.response_policy = response_policy;
            }
            if let Some(dispatch_mode) = intake.dispatch_mode {
                self.intake.dispatch_mode = dispatch_mode;
            }
            if let Some(outbound_timeout_secs) = intake.outbound_timeout_secs {
                self.intake.outbound_timeout_secs = outbound_timeout_secs;
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
        if let Some(value) = read_env("INTAKE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("INTAKE_SERVER_PORT") {
            self.server.port = parse_u16("INTAKE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("INTAKE_SERVER_DEBUG_ENDPOINT") {
            self.server.debug_endpoint = parse_bool("INTAKE_SERVER_DEBUG_ENDPOINT", &value)?;
        }

        if let Some(value) = read_env(ENV_AIRTABLE_API_KEY) {
            self.airtable.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env(ENV_AIRTABLE_BASE_ID) {
            self.airtable.base_id = Some(value);
        }
        if let Some(value) = read_env(ENV_AIRTABLE_TABLE) {
            self.airtable.table = value;
        }
        if let Some(value) = read_env(ENV_AIRTABLE_API_URL) {
            self.airtable.api_url = value;
        }

        if let Some(value) = read_env(ENV_TEXTBELT_API_KEY) {
            self.textbelt.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env(ENV_NOTIFY_PHONE) {
            self.textbelt.notify_phone = Some(value);
        }
        if let Some(value) = read_env(ENV_TEXTBELT_API_URL) {
            self.textbelt.api_url = value;
        }

        if let Some(value) = read_env(ENV_RESEND_API_KEY) {
            self.resend.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env(ENV_FROM_EMAIL) {
            self.resend.from_email = Some(value);
        }
        if let Some(value) = read_env(ENV_NOTIFY_EMAIL) {
            self.resend.notify_email = Some(value);
        }
        if let Some(value) = read_env(ENV_RESEND_REPLY_TO) {
            self.resend.reply_to = Some(value);
        }
        if let Some(value) = read_env(ENV_RESEND_API_URL) {
            self.resend.api_url = value;
        }

        if let Some(value) = read_env("INTAKE_RESPONSE_POLICY") {
            self.intake.response_policy = value.parse()?;
        }
        if let Some(value) = read_env("INTAKE_DISPATCH_MODE") {
            self.intake.dispatch_mode = value.parse()?;
        }
        if let Some(value) = read_env("INTAKE_OUTBOUND_TIMEOUT_SECS") {
            self.intake.outbound_timeout_secs =
                parse_u64("INTAKE_OUTBOUND_TIMEOUT_SECS", &value)?;
        }

        let log_level = read_env("INTAKE_LOGGING_LEVEL").or_else(|| read_env("INTAKE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("INTAKE_LOGGING_FORMAT").or_else(|| read_env("INTAKE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(debug_endpoint) = overrides.debug_endpoint {
            self.server.debug_endpoint = debug_endpoint;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(response_policy) = overrides.response_policy {
            self.intake.response_policy = response_policy;
        }
        if let Some(dispatch_mode) = overrides.dispatch_mode {
            self.intake.dispatch_mode = dispatch_mode;
        }

        if let Some(api_key) = overrides.airtable_api_key {
            self.airtable.api_key = Some(secret_value(api_key));
        }
        if let Some(base_id) = overrides.airtable_base_id {
            self.airtable.base_id = Some(base_id);
        }
        if let Some(api_url) = overrides.airtable_api_url {
            self.airtable.api_url = api_url;
        }

        if let Some(api_key) = overrides.textbelt_api_key {
            self.textbelt.api_key = Some(secret_value(api_key));
        }
        if let Some(notify_phone) = overrides.notify_phone {
            self.textbelt.notify_phone = Some(notify_phone);
        }
        if let Some(api_url) = overrides.textbelt_api_url {
            self.textbelt.api_url = api_url;
        }

        if let Some(api_key) = overrides.resend_api_key {
            self.resend.api_key = Some(secret_value(api_key));
        }
        if let Some(from_email) = overrides.from_email {
            self.resend.from_email = Some(from_email);
        }
        if let Some(notify_email) = overrides.notify_email {
            self.resend.notify_email = Some(notify_email);
        }
        if let Some(reply_to) = overrides.reply_to {
            self.resend.reply_to = Some(reply_to);
        }
        if let Some(api_url) = overrides.resend_api_url {
            self.resend.api_url = api_url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_api_url("airtable.api_url", &self.airtable.api_url)?;
        validate_api_url("textbelt.api_url", &self.textbelt.api_url)?;
        validate_api_url("resend.api_url", &self.resend.api_url)?;
        validate_airtable(&self.airtable)?;
        validate_intake(&self.intake)?;
        validate_logging(&self.logging)?;
        Ok(())
    }

    /// Presence and redacted preview for each variable in
    /// [`DIAGNOSTIC_VARIABLES`]. Secrets are never returned in full.
    pub fn variable_reports(&self) -> Vec<VariableReport> {
        DIAGNOSTIC_VARIABLES
            .into_iter()
            .map(|name| {
                let value = self.variable_value(name);
                VariableReport {
                    name,
                    present: value.is_some(),
                    preview: value.as_deref().map(redact_preview),
                }
            })
            .collect()
    }

    fn variable_value(&self, name: &str) -> Option<String> {
        let exposed = |secret: &Option<SecretString>| {
            secret.as_ref().map(|value| value.expose_secret().to_string())
        };
        match name {
            ENV_AIRTABLE_API_KEY => exposed(&self.airtable.api_key),
            ENV_AIRTABLE_BASE_ID => self.airtable.base_id.clone(),
            ENV_AIRTABLE_TABLE => Some(self.airtable.table.clone()),
            ENV_TEXTBELT_API_KEY => exposed(&self.textbelt.api_key),
            ENV_NOTIFY_PHONE => self.textbelt.notify_phone.clone(),
            ENV_RESEND_API_KEY => exposed(&self.resend.api_key),
            ENV_NOTIFY_EMAIL => self.resend.notify_email.clone(),
            ENV_FROM_EMAIL => self.resend.from_email.clone(),
            _ => None,
        }
        .filter(|value| !value.trim().is_empty())
    }
}

/// Whether a collaborator has everything it needs to make its call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CollaboratorReadiness {
    pub collaborator: Collaborator,
    pub missing: Vec<&'static str>,
}

impl CollaboratorReadiness {
    pub fn is_ready(&self) -> bool {
        self.missing.is_empty()
    }
}

impl AppConfig {
    pub fn collaborator_readiness(&self) -> Vec<CollaboratorReadiness> {
        let secret_set = |secret: &Option<SecretString>| {
            secret.as_ref().is_some_and(|value| !value.expose_secret().trim().is_empty())
        };
        let text_set =
            |value: &Option<String>| value.as_ref().is_some_and(|value| !value.trim().is_empty());

        let airtable = [
            (ENV_AIRTABLE_API_KEY, secret_set(&self.airtable.api_key)),
            (ENV_AIRTABLE_BASE_ID, text_set(&self.airtable.base_id)),
        ];
        let sms = [
            (ENV_TEXTBELT_API_KEY, secret_set(&self.textbelt.api_key)),
            (ENV_NOTIFY_PHONE, text_set(&self.textbelt.notify_phone)),
        ];
        let email = [
            (ENV_RESEND_API_KEY, secret_set(&self.resend.api_key)),
            (ENV_FROM_EMAIL, text_set(&self.resend.from_email)),
            (ENV_NOTIFY_EMAIL, text_set(&self.resend.notify_email)),
        ];

        let missing = |checks: &[(&'static str, bool)]| {
            checks.iter().filter(|(_, set)| !set).map(|(name, _)| *name).collect::<Vec<_>>()
        };

        vec![
            CollaboratorReadiness {
                collaborator: Collaborator::Airtable,
                missing: missing(&airtable[..]),
            },
            CollaboratorReadiness { collaborator: Collaborator::Sms, missing: missing(&sms[..]) },
            CollaboratorReadiness {
                collaborator: Collaborator::Email,
                missing: missing(&email[..]),
            },
        ]
    }
}

/// First four characters followed by `***` for values longer than eight
/// characters, `***` otherwise.
pub fn redact_preview(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.chars().count() > 8 {
        let prefix: String = trimmed.chars().take(4).collect();
        format!("{prefix}***")
    } else {
        "***".to_string()
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("intake.toml"), PathBuf::from("config/intake.toml")]
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

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    Ok(())
}

fn validate_api_url(key: &str, url: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn validate_airtable(airtable: &AirtableConfig) -> Result<(), ConfigError> {
    if airtable.table.trim().is_empty() {
        return Err(ConfigError::Validation("airtable.table must not be empty".to_string()));
    }
    Ok(())
}

fn validate_intake(intake: &IntakeConfig) -> Result<(), ConfigError> {
    if intake.outbound_timeout_secs == 0 || intake.outbound_timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "intake.outbound_timeout_secs must be in range 1..=120".to_string(),
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
    server: Option<ServerPatch>,
    airtable: Option<AirtablePatch>,
    textbelt: Option<TextbeltPatch>,
    resend: Option<ResendPatch>,
    intake: Option<IntakePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    debug_endpoint: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct AirtablePatch {
    api_key: Option<String>,
    base_id: Option<String>,
    table: Option<String>,
    api_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TextbeltPatch {
    api_key: Option<String>,
    notify_phone: Option<String>,
    api_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResendPatch {
    api_key: Option<String>,
    from_email: Option<String>,
    notify_email: Option<String>,
    reply_to: Option<String>,
    api_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IntakePatch {
    response_policy: Option<ResponsePolicy>,
    dispatch_mode: Option<DispatchMode>,
    outbound_timeout_secs: Option<u64>,
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

    use super::{
        redact_preview, AppConfig, ConfigError, ConfigOverrides, DispatchMode, LoadOptions,
        LogFormat, ResponsePolicy,
    };

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

    #[test]
    fn defaults_pick_silent_policy_and_concurrent_dispatch() -> Result<(), String> {
        let config = AppConfig::load(LoadOptions { ignore_env: true, ..LoadOptions::default() })
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(
            config.intake.response_policy == ResponsePolicy::Silent,
            "default policy should be silent",
        )?;
        ensure(
            config.intake.dispatch_mode == DispatchMode::Concurrent,
            "default dispatch should be concurrent",
        )?;
        ensure(!config.server.debug_endpoint, "debug endpoint should be off by default")?;
        ensure(config.airtable.api_key.is_none(), "no airtable key by default")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_INTAKE_AIRTABLE_KEY", "pat-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("intake.toml");
            fs::write(
                &path,
                r#"
[airtable]
api_key = "${TEST_INTAKE_AIRTABLE_KEY}"
base_id = "appBase123"

[resend]
reply_to = "office@example.com"

[intake]
response_policy = "diagnostic"
dispatch_mode = "record_first"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                ignore_env: true,
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.airtable.api_key.as_ref().map(|key| key.expose_secret())
                    == Some("pat-from-env"),
                "api key should be interpolated from environment",
            )?;
            ensure(
                config.airtable.base_id.as_deref() == Some("appBase123"),
                "base id should come from file",
            )?;
            ensure(
                config.resend.reply_to.as_deref() == Some("office@example.com"),
                "reply-to should come from file",
            )?;
            ensure(
                config.intake.response_policy == ResponsePolicy::Diagnostic,
                "policy should come from file",
            )?;
            ensure(
                config.intake.dispatch_mode == DispatchMode::RecordFirst,
                "dispatch mode should come from file",
            )
        })();

        clear_vars(&["TEST_INTAKE_AIRTABLE_KEY"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("INTAKE_NOTIFY_PHONE", "+15550000002");
        env::set_var("INTAKE_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("intake.toml");
            fs::write(
                &path,
                r#"
[textbelt]
notify_phone = "+15550000001"

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

            ensure(
                config.textbelt.notify_phone.as_deref() == Some("+15550000002"),
                "env phone should win over file",
            )?;
            ensure(config.logging.level == "debug", "override log level should win")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "log format alias should be read from env",
            )
        })();

        clear_vars(&["INTAKE_NOTIFY_PHONE", "INTAKE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn validation_rejects_non_http_api_url() -> Result<(), String> {
        let error = match AppConfig::load(LoadOptions {
            ignore_env: true,
            overrides: ConfigOverrides {
                resend_api_url: Some("ftp://resend.example".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected validation failure".to_string()),
            Err(error) => error,
        };

        ensure(
            matches!(error, ConfigError::Validation(ref message) if message.contains("resend.api_url")),
            "validation failure should name resend.api_url",
        )
    }

    #[test]
    fn invalid_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("INTAKE_OUTBOUND_TIMEOUT_SECS", "soon");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid override failure".to_string()),
            Err(error) => ensure(
                matches!(error, ConfigError::InvalidEnvOverride { ref key, .. } if key == "INTAKE_OUTBOUND_TIMEOUT_SECS"),
                "error should name the offending variable",
            ),
        };

        clear_vars(&["INTAKE_OUTBOUND_TIMEOUT_SECS"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let config = AppConfig::load(LoadOptions {
            ignore_env: true,
            overrides: ConfigOverrides {
                airtable_api_key: Some("patSECRETVALUE".to_string()),
                resend_api_key: Some("re_SECRETVALUE".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;
        let debug = format!("{config:?}");

        ensure(!debug.contains("patSECRETVALUE"), "debug output should not contain airtable key")?;
        ensure(!debug.contains("re_SECRETVALUE"), "debug output should not contain resend key")
    }

    #[test]
    fn variable_reports_redact_and_flag_missing_values() -> Result<(), String> {
        let config = AppConfig::load(LoadOptions {
            ignore_env: true,
            overrides: ConfigOverrides {
                airtable_api_key: Some("patABCDEFGHIJKLMN".to_string()),
                notify_phone: Some("5550100".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        let reports = config.variable_reports();
        ensure(reports.len() == 8, "every diagnostic variable should be reported")?;

        let key = &reports[0];
        ensure(key.name == "INTAKE_AIRTABLE_API_KEY", "api key should be reported first")?;
        ensure(key.present, "api key should be present")?;
        ensure(key.preview.as_deref() == Some("patA***"), "long values keep four characters")?;

        let phone = reports
            .iter()
            .find(|report| report.name == "INTAKE_NOTIFY_PHONE")
            .ok_or_else(|| "phone report missing".to_string())?;
        ensure(phone.preview.as_deref() == Some("***"), "short values are fully masked")?;

        let resend = reports
            .iter()
            .find(|report| report.name == "INTAKE_RESEND_API_KEY")
            .ok_or_else(|| "resend report missing".to_string())?;
        ensure(!resend.present && resend.preview.is_none(), "absent values have no preview")
    }

    #[test]
    fn readiness_lists_missing_variables_per_collaborator() -> Result<(), String> {
        let config = AppConfig::load(LoadOptions {
            ignore_env: true,
            overrides: ConfigOverrides {
                airtable_api_key: Some("patKEY".to_string()),
                airtable_base_id: Some("appBASE".to_string()),
                textbelt_api_key: Some("textbelt".to_string()),
                resend_api_key: Some("re_key".to_string()),
                from_email: Some("quotes@example.com".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        let readiness = config.collaborator_readiness();
        ensure(readiness[0].is_ready(), "airtable should be ready")?;
        ensure(
            readiness[1].missing == vec!["INTAKE_NOTIFY_PHONE"],
            "sms should miss the notify phone",
        )?;
        ensure(
            readiness[2].missing == vec!["INTAKE_NOTIFY_EMAIL"],
            "email should miss the notify address",
        )
    }

    #[test]
    fn redact_preview_never_returns_full_value() {
        assert_eq!(redact_preview("re_1234567890"), "re_1***");
        assert_eq!(redact_preview("12345678"), "***");
        assert_eq!(redact_preview(""), "***");
    }
}
