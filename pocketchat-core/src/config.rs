use crate::completion::{DEFAULT_CANDIDATE_MODELS, DEFAULT_CHAT_ENDPOINT};
use serde::{Deserialize, Serialize};

/// User preferences as edited by the settings screen.
///
/// The chat screen only reads these; it never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default = "default_true")]
    pub voice_input: bool,
    #[serde(default)]
    pub auto_send: bool,
    #[serde(default = "default_response_speed")]
    pub response_speed: f32,
    #[serde(default = "default_text_size")]
    pub text_size: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            notifications: true,
            voice_input: true,
            auto_send: false,
            response_speed: default_response_speed(),
            text_size: default_text_size(),
        }
    }
}

impl Settings {
    pub fn is_voice_input_enabled(&self) -> bool {
        self.voice_input
    }

    pub fn is_auto_send_enabled(&self) -> bool {
        self.auto_send
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSettings {
    pub endpoint: String,

    // Priority order: the first entry is the preferred model.
    pub models: Vec<String>,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_CHAT_ENDPOINT.into(),
            models: DEFAULT_CANDIDATE_MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub completion: CompletionSettings,

    // Secrets are stored outside this struct at rest.
    #[serde(default)]
    pub api_key_present: bool,
}

fn default_true() -> bool {
    true
}

fn default_response_speed() -> f32 {
    1.0
}

fn default_text_size() -> f32 {
    16.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: AppConfig = serde_json::from_str(r#"{"settings":{"auto_send":true}}"#).unwrap();
        assert!(cfg.settings.auto_send);
        assert!(cfg.settings.voice_input);
        assert_eq!(cfg.settings.text_size, 16.0);
        assert_eq!(cfg.completion.models[0], "command-r");
        assert!(!cfg.api_key_present);
    }
}
