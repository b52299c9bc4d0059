use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Conversation history bound (user + assistant entries)
    #[serde(default = "default_history_entries")]
    pub history_entries: usize,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            history_entries: default_history_entries(),
            chat: ChatConfig::default(),
            speech: SpeechConfig::default(),
            listen: ListenConfig::default(),
            commands: CommandsConfig::default(),
            automation: AutomationConfig::default(),
        }
    }
}

fn default_name() -> String {
    "Nova".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_history_entries() -> usize {
    crate::history::DEFAULT_MAX_ENTRIES
}

// ============================================================================
// Commands Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CommandsConfig {
    /// Phrases that silence voice output (checked before anything else)
    #[serde(default = "default_mute_phrases")]
    pub mute_phrases: Vec<String>,

    /// Phrases that turn voice output back on
    #[serde(default = "default_unmute_phrases")]
    pub unmute_phrases: Vec<String>,

    /// Phrases that make an unmatched utterance a web search
    #[serde(default = "default_search_indicators")]
    pub search_indicators: Vec<String>,

    /// Verbs that mean "write the answer into the open document too"
    #[serde(default = "default_authoring_verbs")]
    pub authoring_verbs: Vec<String>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            mute_phrases: default_mute_phrases(),
            unmute_phrases: default_unmute_phrases(),
            search_indicators: default_search_indicators(),
            authoring_verbs: default_authoring_verbs(),
        }
    }
}

fn default_mute_phrases() -> Vec<String> {
    vec!["stop".to_string()]
}

fn default_unmute_phrases() -> Vec<String> {
    vec!["speak".to_string()]
}

fn default_search_indicators() -> Vec<String> {
    [
        "search for",
        "what is",
        "who is",
        "where is",
        "how to",
        "tell me about",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_authoring_verbs() -> Vec<String> {
    [
        "write",
        "generate",
        "create a paragraph",
        "create paragraph",
        "type",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

// ============================================================================
// Automation Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AutomationConfig {
    /// Scroll distance per "scroll up/down"
    #[serde(default = "default_scroll_amount")]
    pub scroll_amount: i32,
    /// Upper bound for "backspace N times"
    #[serde(default = "default_max_key_repeat")]
    pub max_key_repeat: u32,
    /// Upper bound for "press enter N times"
    #[serde(default = "default_max_enter_repeat")]
    pub max_enter_repeat: u32,
    /// Base for Desktop/Documents/Downloads (defaults to the user's home)
    #[serde(default)]
    pub home_dir: Option<PathBuf>,
    #[serde(default = "default_random_people_rows")]
    pub random_people_rows: usize,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            scroll_amount: default_scroll_amount(),
            max_key_repeat: default_max_key_repeat(),
            max_enter_repeat: default_max_enter_repeat(),
            home_dir: None,
            random_people_rows: default_random_people_rows(),
        }
    }
}

impl AutomationConfig {
    /// Configured home, else the OS home, else the working directory
    pub fn resolve_home(&self) -> PathBuf {
        self.home_dir
            .clone()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn default_scroll_amount() -> i32 {
    5
}
fn default_max_key_repeat() -> u32 {
    10
}
fn default_max_enter_repeat() -> u32 {
    5
}
fn default_random_people_rows() -> usize {
    10
}

// ============================================================================
// Speech Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_speech_enabled")]
    pub enabled: bool,
    /// Words per minute
    #[serde(default = "default_speech_rate")]
    pub rate: u32,
    /// 0.0-1.0
    #[serde(default = "default_speech_volume")]
    pub volume: f32,
    /// Platform voice name, if not the system default
    #[serde(default)]
    pub voice: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: default_speech_enabled(),
            rate: default_speech_rate(),
            volume: default_speech_volume(),
            voice: None,
        }
    }
}

fn default_speech_enabled() -> bool {
    true
}
fn default_speech_rate() -> u32 {
    140
}
fn default_speech_volume() -> f32 {
    0.95
}

// ============================================================================
// Listen Config
// ============================================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    /// Typed lines on stdin
    #[default]
    Keyboard,
    /// Microphone + local transcription (needs the `mic` feature)
    Mic,
}

#[derive(Debug, Deserialize)]
pub struct ListenConfig {
    #[serde(default)]
    pub source: InputSource,
    #[serde(default = "default_primary_language")]
    pub primary_language: String,
    /// Tried when the primary language produces nothing
    #[serde(default = "default_secondary_language")]
    pub secondary_language: Option<String>,
    #[serde(default = "default_model_path")]
    pub model_path: String,
    #[serde(default = "default_vad_model_path")]
    pub vad_model_path: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            source: InputSource::default(),
            primary_language: default_primary_language(),
            secondary_language: default_secondary_language(),
            model_path: default_model_path(),
            vad_model_path: default_vad_model_path(),
        }
    }
}

fn default_primary_language() -> String {
    "en".into()
}
fn default_secondary_language() -> Option<String> {
    Some("ur".into())
}
fn default_model_path() -> String {
    "models/parakeet-tdt-0.6b-v3-int8".into()
}
fn default_vad_model_path() -> String {
    "models/silero_vad_v4.onnx".into()
}

// ============================================================================
// Chat Config
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "backend")]
pub enum ChatConfig {
    /// No conversational fallback; unmatched utterances get a fixed reply
    #[serde(rename = "none")]
    Disabled,
    #[serde(rename = "openai-compat")]
    OpenAiCompat {
        /// Base URL - can use preset or explicit URL
        #[serde(default)]
        base_url: String,
        /// Preset shortcuts: "groq", "openai", "lm_studio", "ollama"
        #[serde(default = "default_preset")]
        preset: Option<String>,
        #[serde(default = "default_chat_model")]
        model: String,
        /// API key (supports ${ENV_VAR} syntax)
        #[serde(default = "default_api_key")]
        api_key: Option<String>,
        #[serde(default = "default_temperature")]
        temperature: f32,
        #[serde(default = "default_top_p")]
        top_p: f32,
        #[serde(default = "default_max_tokens")]
        max_tokens: u32,
        /// History entries sent along with each request
        #[serde(default = "default_history_turns")]
        history_turns: usize,
    },
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig::OpenAiCompat {
            base_url: String::new(),
            preset: default_preset(),
            model: default_chat_model(),
            api_key: default_api_key(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            history_turns: default_history_turns(),
        }
    }
}

fn default_preset() -> Option<String> {
    Some("groq".into())
}
fn default_chat_model() -> String {
    "llama-3.1-8b-instant".into()
}
fn default_api_key() -> Option<String> {
    Some("${GROQ_API_KEY}".into())
}
fn default_temperature() -> f32 {
    0.7
}
fn default_top_p() -> f32 {
    1.0
}
fn default_max_tokens() -> u32 {
    220
}
fn default_history_turns() -> usize {
    10
}

/// Expand ${VAR} to environment variable values
fn expand_env_vars(s: &str) -> String {
    expand_with(s, |name| {
        std::env::var(name)
            .inspect_err(|_| warn!("Environment variable '{}' not found", name))
            .ok()
    })
}

/// Substituted values are never rescanned, so a value containing `${` is kept literally
fn expand_with(s: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&lookup(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);

    result
}

impl ChatConfig {
    /// Resolve preset to base_url if needed, and expand env vars in api_key
    pub fn resolve_presets(&mut self) {
        if let ChatConfig::OpenAiCompat {
            base_url,
            preset,
            api_key,
            ..
        } = self
        {
            if base_url.is_empty() {
                *base_url = match preset.as_deref() {
                    Some("groq") | None => "https://api.groq.com/openai/v1".to_string(),
                    Some("openai") => "https://api.openai.com/v1".to_string(),
                    Some("lm_studio") => "http://localhost:1234/v1".to_string(),
                    Some("ollama") => "http://localhost:11434/v1".to_string(),
                    Some(other) => {
                        warn!("Unknown preset '{}', using Groq", other);
                        "https://api.groq.com/openai/v1".to_string()
                    }
                };
            }

            if let Some(key) = api_key {
                *key = expand_env_vars(key);
                if key.is_empty() {
                    *api_key = None;
                }
            }
        }
    }
}

impl Config {
    /// Load from `path` (or ./config.toml); missing or broken files fall back to defaults
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        let mut config = if path.exists() {
            match fs::read_to_string(path) {
                Ok(s) => Self::parse(&s).unwrap_or_else(|e| {
                    warn!("Ignoring {}: {}", path.display(), e);
                    Config::default()
                }),
                Err(e) => {
                    warn!("Could not read {}: {}", path.display(), e);
                    Config::default()
                }
            }
        } else {
            Config::default()
        };

        config.chat.resolve_presets();
        config
    }

    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
