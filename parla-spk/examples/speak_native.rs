//! Speak a line of text through espeak-ng
//!
//! ```text
//! cargo run -p parla-spk --example speak_native -- "Hello there" [voice] [config.toml]
//! ```

use anyhow::Context;
use parla_spk::engines;
use parla_spk::{FormEvent, FormView, SpeechApp, SpeechConfig, VoiceOption};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// A form whose controls are fixed at startup
struct StaticForm {
    text: String,
    voice: Option<String>,
}

impl FormView for StaticForm {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn selected_voice(&self) -> Option<String> {
        self.voice.clone()
    }

    fn rate(&self) -> f32 {
        1.0
    }

    fn pitch(&self) -> f32 {
        1.0
    }

    fn set_rate_readout(&self, _value: f32) {}

    fn set_pitch_readout(&self, _value: f32) {}

    fn replace_voice_options(&self, options: &[VoiceOption]) {
        println!("{} voices available", options.len());
        for option in options.iter().take(5) {
            println!("  {}", option.label);
        }
    }

    fn blur_text(&self) {}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let text = args
        .next()
        .unwrap_or_else(|| "Hello, this is parla speaking.".to_string());
    let voice = args.next();

    let mut config = match args.next() {
        Some(path) => SpeechConfig::load(Path::new(&path)).context("loading configuration")?,
        None => SpeechConfig::default(),
    };
    config.apply_env();
    tracing::debug!("Effective configuration:\n{}", config.to_toml_string()?);

    let engine = engines::from_config(&config)?;
    let app = SpeechApp::new(engine, StaticForm { text, voice }, config)?;

    let mut outcomes = app.controller().subscribe();
    app.binding().on_submit().context("starting speech")?;

    let outcome = outcomes.recv().await?;
    if outcome.is_completed() {
        println!("Done.");
    } else {
        println!("Speech failed: {:?}", outcome);
    }

    Ok(())
}
