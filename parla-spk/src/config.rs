//! Configuration for the speech front-end

use crate::error::SpeechError;
use parla_core::config::{env_override, load_toml, parse_toml, to_toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Front-end configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Which host engine to drive
    pub engine: EngineKind,

    /// Capacity of the outcome broadcast channel
    pub event_capacity: usize,

    /// DOM element lookup for the browser form
    pub form: FormConfig,

    /// espeak-ng settings (native hosts)
    pub espeak: EspeakConfig,
}

/// Engine type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Web Speech API (`window.speechSynthesis`)
    Web,
    /// espeak-ng command line synthesizer
    Espeak,
}

impl FromStr for EngineKind {
    type Err = SpeechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "web" => Ok(EngineKind::Web),
            "espeak" | "espeak-ng" => Ok(EngineKind::Espeak),
            other => Err(SpeechError::Config(format!("Unknown engine: {}", other))),
        }
    }
}

/// Element lookup for the form controls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FormConfig {
    /// CSS selector of the form element
    pub form_selector: String,
    pub text_input: String,
    pub voice_select: String,
    pub rate: String,
    pub rate_value: String,
    pub pitch: String,
    pub pitch_value: String,
}

/// espeak-ng configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EspeakConfig {
    /// Explicit binary path; `PATH` is searched for `espeak-ng` when unset
    pub binary: Option<PathBuf>,

    /// Words per minute at rate 1.0
    pub base_wpm: u32,

    /// espeak pitch (0-99) at pitch 1.0
    pub base_pitch: u8,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        let engine = if cfg!(target_arch = "wasm32") {
            EngineKind::Web
        } else {
            EngineKind::Espeak
        };

        Self {
            engine,
            event_capacity: 16,
            form: FormConfig::default(),
            espeak: EspeakConfig::default(),
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            form_selector: "form".to_string(),
            text_input: "text-input".to_string(),
            voice_select: "voice-select".to_string(),
            rate: "rate".to_string(),
            rate_value: "rate-value".to_string(),
            pitch: "pitch".to_string(),
            pitch_value: "pitch-value".to_string(),
        }
    }
}

impl Default for EspeakConfig {
    fn default() -> Self {
        Self {
            binary: None,
            base_wpm: 175,
            base_pitch: 50,
        }
    }
}

impl FormConfig {
    /// Validate element lookups
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("form_selector", &self.form_selector),
            ("text_input", &self.text_input),
            ("voice_select", &self.voice_select),
            ("rate", &self.rate),
            ("rate_value", &self.rate_value),
            ("pitch", &self.pitch),
            ("pitch_value", &self.pitch_value),
        ];

        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(format!("Form element '{}' cannot be empty", field));
            }
            if value.chars().any(|c| c == '\0' || c.is_control()) {
                return Err(format!("Form element '{}' contains invalid characters", field));
            }
        }

        Ok(())
    }
}

impl EspeakConfig {
    /// Validate espeak configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.base_wpm == 0 || self.base_wpm > 1000 {
            return Err("Base speed must be between 1 and 1000 WPM".to_string());
        }

        if self.base_pitch > 99 {
            return Err("Base pitch must be between 0 and 99".to_string());
        }

        if let Some(ref binary) = self.binary {
            if binary.as_os_str().is_empty() {
                return Err("espeak binary path cannot be empty if provided".to_string());
            }
        }

        Ok(())
    }
}

impl SpeechConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.event_capacity == 0 {
            return Err("Event capacity must be greater than 0".to_string());
        }

        if self.event_capacity > 10_000 {
            return Err("Event capacity too large (max 10000)".to_string());
        }

        self.form.validate()?;
        self.espeak.validate()?;

        Ok(())
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, SpeechError> {
        let config: SpeechConfig = parse_toml(content)?;
        config.validate().map_err(SpeechError::Config)?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, SpeechError> {
        let config: SpeechConfig = load_toml(path)?;
        config.validate().map_err(SpeechError::Config)?;
        Ok(config)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, SpeechError> {
        Ok(to_toml(self)?)
    }

    /// Apply `PARLA_ENGINE`, `PARLA_ESPEAK_BIN` and `PARLA_EVENT_CAPACITY`
    pub fn apply_env(&mut self) {
        if let Some(engine) = env_override::<EngineKind>("PARLA_ENGINE") {
            self.engine = engine;
        }
        if let Some(binary) = env_override::<PathBuf>("PARLA_ESPEAK_BIN") {
            self.espeak.binary = Some(binary);
        }
        if let Some(capacity) = env_override::<usize>("PARLA_EVENT_CAPACITY") {
            self.event_capacity = capacity;
        }
    }
}
