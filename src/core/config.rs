//! Configuration from the environment (`.env` is loaded by `main`).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use async_openai::config::OpenAIConfig;

use crate::core::display::Pacing;
use crate::core::paths;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// Keys shorter than this are treated as unset placeholders.
const MIN_API_KEY_LEN: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` when no usable API key is set; answers then come from demo mode.
    pub openai_config: Option<OpenAIConfig>,
    /// API key with all but its ends hidden, for display.
    pub masked_api_key: Option<String>,
    pub api_base: String,
    pub model_id: String,
    pub max_chunk_length: usize,
    pub pacing: Pacing,
    pub idle_timeout: Duration,
    /// Characters per line on the glasses display.
    pub line_width: usize,
    pub show_live_transcription: bool,
    pub knowledge_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
}

/// Load configuration from the process environment.
pub fn load() -> Result<Config, ConfigError> {
    load_from(|key| env::var(key).ok())
}

/// Load configuration using `lookup` to read variables.
pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
    let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let api_base = var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let model_id = var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let api_key = var("OPENAI_API_KEY").filter(|key| is_usable_api_key(key));
    let masked_api_key = api_key.as_deref().map(mask_api_key);
    let openai_config = api_key.map(|key| {
        OpenAIConfig::new()
            .with_api_base(api_base.clone())
            .with_api_key(key)
    });

    let defaults = Pacing::default();
    let pacing = Pacing {
        base_ms: parse_or(&var, "GLASSES_BASE_MS", defaults.base_ms)?,
        per_char_ms: parse_or(&var, "GLASSES_PER_CHAR_MS", defaults.per_char_ms)?,
        cap_ms: parse_or(&var, "GLASSES_CAP_MS", defaults.cap_ms)?,
    };

    let max_chunk_length = parse_or(&var, "GLASSES_MAX_CHUNK_LENGTH", 150usize)?;
    if max_chunk_length == 0 {
        return Err(ConfigError::Zero {
            var: "GLASSES_MAX_CHUNK_LENGTH",
        });
    }

    let knowledge_path = var("GLASSES_KNOWLEDGE_FILE")
        .map(PathBuf::from)
        .or_else(paths::default_knowledge_path);

    Ok(Config {
        openai_config,
        masked_api_key,
        api_base,
        model_id,
        max_chunk_length,
        pacing,
        idle_timeout: Duration::from_secs(parse_or(&var, "GLASSES_IDLE_SECS", 30u64)?),
        line_width: parse_or(&var, "GLASSES_LINE_WIDTH", 40usize)?,
        show_live_transcription: parse_bool_or(&var, "GLASSES_SHOW_TRANSCRIPTION", true)?,
        knowledge_path,
    })
}

/// Rejects template values such as `your_openai_api_key_here`.
fn is_usable_api_key(key: &str) -> bool {
    key.len() >= MIN_API_KEY_LEN && !key.starts_with("your_") && !key.ends_with("_here")
}

/// `sk-abcdefghijkl` -> `sk-a...ijkl`.
fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(4).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}

fn parse_or<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(key) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { var: key, value }),
    }
}

fn parse_bool_or(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match var(key) {
        None => Ok(default),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { var: key, value }),
        },
    }
}

impl Config {
    /// Whether answers can come from the language model (otherwise demo mode).
    pub fn has_api_key(&self) -> bool {
        self.openai_config.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_from(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = from(&[]).unwrap();
        assert!(!config.has_api_key());
        assert_eq!(config.api_base, DEFAULT_BASE_URL);
        assert_eq!(config.model_id, DEFAULT_MODEL);
        assert_eq!(config.max_chunk_length, 150);
        assert_eq!(config.pacing, Pacing::default());
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
        assert_eq!(config.line_width, 40);
        assert!(config.show_live_transcription);
    }

    #[test]
    fn reads_overrides() {
        let config = from(&[
            ("OPENAI_API_KEY", "sk-abcdefghijklmnop"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("GLASSES_MAX_CHUNK_LENGTH", "200"),
            ("GLASSES_BASE_MS", "3000"),
            ("GLASSES_PER_CHAR_MS", " 30 "),
            ("GLASSES_CAP_MS", "8000"),
            ("GLASSES_SHOW_TRANSCRIPTION", "off"),
            ("GLASSES_KNOWLEDGE_FILE", "/tmp/kb.json"),
        ])
        .unwrap();
        assert!(config.has_api_key());
        assert_eq!(config.masked_api_key.as_deref(), Some("sk-a...mnop"));
        assert_eq!(config.model_id, "gpt-4o-mini");
        assert_eq!(config.max_chunk_length, 200);
        assert_eq!(
            config.pacing,
            Pacing {
                base_ms: 3000,
                per_char_ms: 30,
                cap_ms: 8000
            }
        );
        assert!(!config.show_live_transcription);
        assert_eq!(config.knowledge_path, Some(PathBuf::from("/tmp/kb.json")));
    }

    #[test]
    fn placeholder_api_key_is_ignored() {
        let config = from(&[("OPENAI_API_KEY", "your_openai_api_key_here")]).unwrap();
        assert!(!config.has_api_key());
        let config = from(&[("OPENAI_API_KEY", "short")]).unwrap();
        assert!(!config.has_api_key());
    }

    #[test]
    fn invalid_number_is_an_error() {
        let err = from(&[("GLASSES_CAP_MS", "soon")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "GLASSES_CAP_MS",
                ..
            }
        ));
        assert!(err.to_string().contains("GLASSES_CAP_MS"));
    }

    #[test]
    fn zero_chunk_length_is_an_error() {
        let err = from(&[("GLASSES_MAX_CHUNK_LENGTH", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Zero { .. }));
    }

    #[test]
    fn invalid_bool_is_an_error() {
        assert!(from(&[("GLASSES_SHOW_TRANSCRIPTION", "maybe")]).is_err());
    }
}
