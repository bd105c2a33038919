//! parla-spk: speak typed text through the host's speech synthesizer
//!
//! Provides:
//! - A voice catalog kept in sync with the engine's voice list
//! - A single-flight utterance controller with explicit outcomes
//! - A form binding that maps UI events onto the controller
//! - Engines for the Web Speech API (`web` feature) and espeak-ng (native)

pub mod app;
pub mod catalog;
pub mod config;
pub mod controller;
#[cfg(feature = "web")]
pub mod dom;
pub mod engines;
pub mod error;
pub mod form;
pub mod voice;

pub use app::SpeechApp;
pub use catalog::VoiceCatalog;
pub use config::{EngineKind, EspeakConfig, FormConfig, SpeechConfig};
pub use controller::{
    OutcomeHandle, SpeechOutcome, SpeechState, Utterance, UtteranceController, UtteranceRequest,
    DROPPED_REASON,
};
pub use engines::SpeechEngine;
pub use error::SpeechError;
pub use form::{FormBinding, FormEvent, FormView};
pub use voice::{Voice, VoiceOption};
