//! Configuration loading and validation tests

#![cfg(not(target_arch = "wasm32"))]

use parla_core::Error as CoreError;
use parla_spk::{EngineKind, EspeakConfig, FormConfig, SpeechConfig, SpeechError};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

#[test]
fn test_default_config_is_valid() {
    let config = SpeechConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.event_capacity, 16);
    assert_eq!(config.form.text_input, "text-input");
    assert_eq!(config.form.voice_select, "voice-select");
    assert_eq!(config.espeak.base_wpm, 175);
    assert_eq!(config.espeak.base_pitch, 50);
    assert!(config.espeak.binary.is_none());

    #[cfg(not(target_arch = "wasm32"))]
    assert_eq!(config.engine, EngineKind::Espeak);
}

#[test]
fn test_validation_rejects_bad_values() {
    let mut config = SpeechConfig::default();
    config.event_capacity = 0;
    assert!(config.validate().is_err());
    config.event_capacity = 10_001;
    assert!(config.validate().is_err());

    let form = FormConfig {
        rate_value: "  ".to_string(),
        ..FormConfig::default()
    };
    assert!(form.validate().unwrap_err().contains("rate_value"));

    let form = FormConfig {
        pitch: "pitch\n".to_string(),
        ..FormConfig::default()
    };
    assert!(form.validate().is_err());

    let espeak = EspeakConfig {
        base_wpm: 0,
        ..EspeakConfig::default()
    };
    assert!(espeak.validate().is_err());

    let espeak = EspeakConfig {
        base_pitch: 100,
        ..EspeakConfig::default()
    };
    assert!(espeak.validate().is_err());

    let espeak = EspeakConfig {
        binary: Some(PathBuf::new()),
        ..EspeakConfig::default()
    };
    assert!(espeak.validate().is_err());
}

#[test]
fn test_from_toml_keeps_defaults_for_missing_keys() {
    let config = SpeechConfig::from_toml_str(
        r#"
engine = "web"

[form]
text_input = "message"

[espeak]
base_wpm = 200
"#,
    )
    .unwrap();

    assert_eq!(config.engine, EngineKind::Web);
    assert_eq!(config.event_capacity, 16);
    assert_eq!(config.form.text_input, "message");
    assert_eq!(config.form.voice_select, "voice-select");
    assert_eq!(config.espeak.base_wpm, 200);
    assert_eq!(config.espeak.base_pitch, 50);
}

#[test]
fn test_from_toml_rejects_invalid_documents() {
    let result = SpeechConfig::from_toml_str("engine = [");
    assert!(matches!(result, Err(SpeechError::Core(CoreError::Deserialization(_)))));

    let result = SpeechConfig::from_toml_str("engine = \"festival\"");
    assert!(result.is_err());

    let result = SpeechConfig::from_toml_str("event_capacity = 0");
    assert!(matches!(result, Err(SpeechError::Config(_))));
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "event_capacity = 64").unwrap();
    writeln!(file, "[espeak]").unwrap();
    writeln!(file, "binary = \"/opt/espeak/bin/espeak-ng\"").unwrap();

    let config = SpeechConfig::load(file.path()).unwrap();

    assert_eq!(config.event_capacity, 64);
    assert_eq!(
        config.espeak.binary,
        Some(PathBuf::from("/opt/espeak/bin/espeak-ng"))
    );
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = SpeechConfig::load(&dir.path().join("parla.toml"));

    assert!(matches!(result, Err(SpeechError::Core(CoreError::Configuration(_)))));
}

// The only test in this binary that touches PARLA_* variables
#[test]
fn test_apply_env_overrides() {
    std::env::set_var("PARLA_ENGINE", "espeak-ng");
    std::env::set_var("PARLA_ESPEAK_BIN", "/usr/local/bin/espeak-ng");
    std::env::set_var("PARLA_EVENT_CAPACITY", "not-a-number");

    let mut config = SpeechConfig {
        engine: EngineKind::Web,
        ..SpeechConfig::default()
    };
    config.apply_env();

    assert_eq!(config.engine, EngineKind::Espeak);
    assert_eq!(
        config.espeak.binary,
        Some(PathBuf::from("/usr/local/bin/espeak-ng"))
    );
    // Unparseable values are ignored
    assert_eq!(config.event_capacity, 16);

    std::env::set_var("PARLA_EVENT_CAPACITY", "32");
    config.apply_env();
    assert_eq!(config.event_capacity, 32);

    std::env::remove_var("PARLA_ENGINE");
    std::env::remove_var("PARLA_ESPEAK_BIN");
    std::env::remove_var("PARLA_EVENT_CAPACITY");
}

#[test]
fn test_engine_kind_from_str() {
    assert_eq!("web".parse::<EngineKind>().unwrap(), EngineKind::Web);
    assert_eq!("ESPEAK".parse::<EngineKind>().unwrap(), EngineKind::Espeak);
    assert_eq!("espeak-ng".parse::<EngineKind>().unwrap(), EngineKind::Espeak);
    assert!(matches!(
        "festival".parse::<EngineKind>(),
        Err(SpeechError::Config(_))
    ));
}

#[test]
fn test_error_conversion_to_core() {
    let err: CoreError = SpeechError::Config("bad".to_string()).into();
    assert!(matches!(err, CoreError::Configuration(ref m) if m == "bad"));

    let err: CoreError = SpeechError::AlreadySpeaking.into();
    assert!(matches!(err, CoreError::Speech(ref m) if m == "The app is already speaking"));

    let inner = CoreError::Serialization("oops".to_string());
    let err: CoreError = SpeechError::from(inner).into();
    assert!(matches!(err, CoreError::Serialization(_)));
}

#[test]
fn test_effective_config_renders_back_to_toml() {
    let mut config = SpeechConfig::default();
    config.form.text_input = "message".to_string();

    let rendered = config.to_toml_string().unwrap();
    let parsed = SpeechConfig::from_toml_str(&rendered).unwrap();

    assert!(rendered.contains("[form]"));
    assert_eq!(parsed.form, config.form);
}
