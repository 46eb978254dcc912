//! Configuration for the wordcue experiment runner.

use crate::display::Key;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for an experiment session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Total length of the trial loop
    #[serde(with = "duration_serde")]
    pub session_duration: Duration,

    /// How long the condition prompt stays on screen
    #[serde(with = "duration_serde")]
    pub label_duration: Duration,

    /// How long the fixation cross stays on screen after a response
    #[serde(with = "duration_serde")]
    pub fixation_duration: Duration,

    /// Fixation period between the intro screens and the first trial
    #[serde(with = "duration_serde")]
    pub countdown_duration: Duration,

    /// How long a response trigger is held before the line is reset
    #[serde(with = "duration_serde")]
    pub response_pulse: Duration,

    /// Give up waiting for a response after this long (never, if unset)
    #[serde(with = "option_duration_serde")]
    pub response_timeout: Option<Duration>,

    /// Experimental conditions, chosen uniformly at random per trial
    pub conditions: Vec<ConditionConfig>,

    /// Accepted response keys and their trigger codes
    pub responses: Vec<ResponseConfig>,

    /// Trigger code sent on fixation onset
    pub fixation_trigger: u8,

    /// Key that ends the session early
    pub abort_key: Key,

    /// Key that dismisses the intro screens
    pub advance_key: Key,

    /// Delimited word file with `word` and `condition` columns
    pub word_list: PathBuf,

    /// Field delimiter of the word file
    pub word_delimiter: char,

    /// Folder receiving per-participant result files
    pub save_folder: PathBuf,

    /// Path for the session ledger and log file
    pub data_path: PathBuf,

    /// Trigger output
    pub trigger: TriggerConfig,

    /// Paragraphs of the consent screen
    pub consent_text: Vec<String>,

    /// Paragraphs of the instruction screen
    pub instruction_text: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wordcue");

        Self {
            session_duration: Duration::from_secs(15 * 60),
            label_duration: Duration::from_millis(1500),
            fixation_duration: Duration::from_secs(3),
            countdown_duration: Duration::from_secs(5),
            response_pulse: Duration::from_millis(1),
            response_timeout: None,
            conditions: vec![
                ConditionConfig {
                    id: 1,
                    prompt: "Includes 'A'?".to_string(),
                    label_trigger: 2,
                    word_trigger: 20,
                },
                ConditionConfig {
                    id: 2,
                    prompt: "Living?".to_string(),
                    label_trigger: 3,
                    word_trigger: 30,
                },
            ],
            responses: vec![
                ResponseConfig {
                    key: Key::Char('y'),
                    trigger: 1,
                },
                ResponseConfig {
                    key: Key::Char('n'),
                    trigger: 0,
                },
            ],
            fixation_trigger: 255,
            abort_key: Key::Escape,
            advance_key: Key::Char('t'),
            word_list: PathBuf::from("word_dataset.csv"),
            word_delimiter: ';',
            save_folder: PathBuf::from("EEG_data"),
            data_path: data_dir,
            trigger: TriggerConfig::default(),
            consent_text: vec![
                "Welcome to the experiment! :)".to_string(),
                "The data will be used for a Cognitive Science exam project.".to_string(),
                "Your data will be anonymized and by continuing you accept that your data will be used."
                    .to_string(),
                "It will not be used for any other purpose.".to_string(),
                "By pressing \"T\" you agree to the conditions mentioned above and continue."
                    .to_string(),
            ],
            instruction_text: vec![
                "The experiment contains 2 conditions:".to_string(),
                "1. Includes \"A\": Press \"Y\" if the word contains A, \"N\" if not.".to_string(),
                "2. Living?: Press \"Y\" if it is a living thing, \"N\" if not.".to_string(),
                "Press \"T\" to begin. The experiment starts 5 seconds after.".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse a configuration document. Missing fields take their defaults.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wordcue")
            .join("config.json")
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Check the settings a session depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.conditions.is_empty() {
            return Err(ConfigError::Invalid("at least one condition is required".into()));
        }
        if self.responses.is_empty() {
            return Err(ConfigError::Invalid("at least one response key is required".into()));
        }

        let mut ids = HashSet::new();
        for condition in &self.conditions {
            if !ids.insert(condition.id) {
                return Err(ConfigError::Invalid(format!(
                    "condition {} is defined more than once",
                    condition.id
                )));
            }
        }

        let mut keys = HashSet::new();
        for response in &self.responses {
            if response.key == self.abort_key {
                return Err(ConfigError::Invalid(format!(
                    "response key '{}' is also the abort key",
                    response.key
                )));
            }
            if !keys.insert(response.key) {
                return Err(ConfigError::Invalid(format!(
                    "response key '{}' is mapped more than once",
                    response.key
                )));
            }
        }

        self.delimiter_byte()?;

        Ok(())
    }

    /// The word file delimiter as the byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        match u8::try_from(u32::from(self.word_delimiter)) {
            Ok(byte) if byte.is_ascii() => Ok(byte),
            _ => Err(ConfigError::Invalid(format!(
                "word delimiter '{}' must be a single ASCII character",
                self.word_delimiter
            ))),
        }
    }

    /// Look up a condition by id.
    pub fn condition(&self, id: i64) -> Option<&ConditionConfig> {
        self.conditions.iter().find(|c| c.id == id)
    }

    /// Trigger code for a response key, if the key is a response key.
    pub fn response_trigger(&self, key: Key) -> Option<u8> {
        self.responses
            .iter()
            .find(|r| r.key == key)
            .map(|r| r.trigger)
    }

    /// Keys accepted while waiting for a response, abort key last.
    pub fn response_keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.responses.iter().map(|r| r.key).collect();
        keys.push(self.abort_key);
        keys
    }
}

/// A single experimental condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionConfig {
    /// Value matched against the word file's `condition` column
    pub id: i64,
    /// Question shown before the word
    pub prompt: String,
    /// Trigger code sent on prompt onset
    pub label_trigger: u8,
    /// Trigger code sent on word onset
    pub word_trigger: u8,
}

/// A response key and the trigger it emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseConfig {
    pub key: Key,
    pub trigger: u8,
}

/// Where trigger codes are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Device file receiving one byte per code (no hardware output when unset)
    pub device: Option<PathBuf>,
    /// Byte offset to seek to before each write, e.g. 888 (0x378) on `/dev/port`
    pub offset: Option<u64>,
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration, stored as whole milliseconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod option_duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration
            .map(|d| d.as_millis() as u64)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.session_duration, Duration::from_secs(900));
        assert_eq!(config.label_duration, Duration::from_millis(1500));
        assert_eq!(config.fixation_duration, Duration::from_secs(3));
        assert_eq!(config.fixation_trigger, 255);
        assert_eq!(config.word_delimiter, ';');
        assert!(config.response_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_trigger_codes() {
        let config = Config::default();
        let first = config.condition(1).unwrap();
        assert_eq!((first.label_trigger, first.word_trigger), (2, 20));
        let second = config.condition(2).unwrap();
        assert_eq!((second.label_trigger, second.word_trigger), (3, 30));

        assert_eq!(config.response_trigger(Key::Char('y')), Some(1));
        assert_eq!(config.response_trigger(Key::Char('n')), Some(0));
        assert_eq!(config.response_trigger(Key::Escape), None);
    }

    #[test]
    fn test_response_keys_end_with_abort() {
        let config = Config::default();
        assert_eq!(
            config.response_keys(),
            vec![Key::Char('y'), Key::Char('n'), Key::Escape]
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json(
            r#"{ "session_duration": 60000, "response_timeout": 2500, "abort_key": "q" }"#,
        )
        .unwrap();
        assert_eq!(config.session_duration, Duration::from_secs(60));
        assert_eq!(config.response_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.abort_key, Key::Char('q'));
        assert_eq!(config.conditions.len(), 2);
    }

    #[test]
    fn test_json_roundtrip_keeps_keys() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"escape\""));
        let parsed = Config::from_json(&json).unwrap();
        assert_eq!(parsed.responses, config.responses);
        assert_eq!(parsed.advance_key, Key::Char('t'));
    }

    #[test]
    fn test_delimiter_byte() {
        let mut config = Config::default();
        assert_eq!(config.delimiter_byte().unwrap(), b';');

        config.word_delimiter = '\t';
        assert_eq!(config.delimiter_byte().unwrap(), b'\t');

        // 'Ż' is U+017B; truncating it would give '{'
        config.word_delimiter = 'Ż';
        assert!(matches!(config.delimiter_byte(), Err(ConfigError::Invalid(_))));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_conditions() {
        let mut config = Config::default();
        config.conditions[1].id = 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_abort_as_response() {
        let mut config = Config::default();
        config.responses[0].key = Key::Escape;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_empty_lists() {
        let mut config = Config::default();
        config.conditions.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.responses.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_key_name_fails_to_parse() {
        let result = Config::from_json(r#"{ "abort_key": "hyper" }"#);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
