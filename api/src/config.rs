//! Process configuration, read once at startup.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("KID_BACKEND=openai requires OPENAI_API_KEY to be set")]
    MissingApiKey,
}

/// Which origins the browser may call from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl AllowedOrigins {
    fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
            AllowedOrigins::Any
        } else {
            AllowedOrigins::List(origins)
        }
    }
}

/// Connection settings for an OpenAI-compatible chat completions endpoint.
#[derive(Clone, PartialEq)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: Url,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

// Hand-written so the key never reaches a log line.
impl fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendConfig {
    OpenAi(OpenAiSettings),
    Offline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    pub allowed_origins: AllowedOrigins,
    pub backend: BackendConfig,
    pub history_window: usize,
    pub backend_timeout: Duration,
    pub identifier_from_history: bool,
    pub chat_rate_per_minute: u32,
    pub chat_rate_burst: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = parse_or(&get, "PORT", DEFAULT_PORT)?;
        let allowed_origins = AllowedOrigins::parse(&get("ALLOWED_ORIGINS").unwrap_or_default());

        let api_key = get("OPENAI_API_KEY");
        let wants_openai = match get("KID_BACKEND").map(|v| v.to_ascii_lowercase()).as_deref() {
            Some("openai") => {
                if api_key.is_none() {
                    return Err(ConfigError::MissingApiKey);
                }
                true
            }
            Some("offline") => false,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "KID_BACKEND",
                    value: other.to_string(),
                    reason: "expected \"openai\" or \"offline\"".to_string(),
                });
            }
            None => api_key.is_some(),
        };

        let backend = match api_key {
            Some(api_key) if wants_openai => {
                let raw_url =
                    get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
                let base_url = Url::parse(&raw_url).map_err(|err| ConfigError::Invalid {
                    name: "OPENAI_BASE_URL",
                    value: raw_url.clone(),
                    reason: err.to_string(),
                })?;
                if !matches!(base_url.scheme(), "http" | "https") {
                    return Err(ConfigError::Invalid {
                        name: "OPENAI_BASE_URL",
                        value: raw_url,
                        reason: "scheme must be http or https".to_string(),
                    });
                }

                let temperature: f32 = parse_or(&get, "KID_TEMPERATURE", 0.7)?;
                if !(0.0..=2.0).contains(&temperature) {
                    return Err(ConfigError::Invalid {
                        name: "KID_TEMPERATURE",
                        value: temperature.to_string(),
                        reason: "must be between 0 and 2".to_string(),
                    });
                }

                BackendConfig::OpenAi(OpenAiSettings {
                    api_key,
                    base_url,
                    model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                    temperature,
                    max_tokens: positive(&get, "KID_MAX_TOKENS", 1000)?,
                })
            }
            _ => BackendConfig::Offline,
        };

        Ok(Self {
            port,
            allowed_origins,
            backend,
            history_window: parse_or(&get, "KID_HISTORY_WINDOW", 10)?,
            backend_timeout: Duration::from_secs(positive(&get, "KID_BACKEND_TIMEOUT_SECS", 30)?),
            identifier_from_history: parse_bool_or(&get, "KID_IDENTIFIER_FROM_HISTORY", true)?,
            chat_rate_per_minute: positive(&get, "KID_CHAT_RATE_PER_MINUTE", 30)?,
            chat_rate_burst: positive(&get, "KID_CHAT_RATE_BURST", 10)?,
        })
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            BackendConfig::OpenAi(_) => "openai",
            BackendConfig::Offline => "offline",
        }
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|err: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: err.to_string(),
        }),
    }
}

fn positive<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    let value = parse_or(get, name, default)?;
    if value == T::default() {
        return Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn parse_bool_or<G>(get: &G, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(name).map(|v| v.to_ascii_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            name,
            value: other.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
