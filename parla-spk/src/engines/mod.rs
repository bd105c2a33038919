//! Speech engine implementations

#[cfg(not(target_arch = "wasm32"))]
pub mod espeak;
#[cfg(feature = "web")]
pub mod web;

use crate::config::{EngineKind, SpeechConfig};
use crate::controller::Utterance;
use crate::error::SpeechError;
use crate::voice::Voice;
use std::sync::Arc;

/// Callback fired when the engine's voice list changes
pub type VoicesChangedListener = Box<dyn Fn() + Send + Sync>;

/// Host speech synthesis capability
pub trait SpeechEngine: Send + Sync {
    /// Get engine name
    fn name(&self) -> &str;

    /// Check if engine is available
    fn is_available(&self) -> bool;

    /// Voices in the engine's own order
    fn list_voices(&self) -> Result<Vec<Voice>, SpeechError>;

    /// Whether the engine is currently producing speech
    fn is_speaking(&self) -> bool;

    /// Start speaking.
    ///
    /// On `Ok` the engine owns the utterance and must eventually resolve its
    /// [`OutcomeHandle`](crate::controller::OutcomeHandle). On `Err` nothing
    /// was started.
    fn speak(&self, utterance: Utterance) -> Result<(), SpeechError>;

    /// Register for "voice list changed" notifications.
    ///
    /// Engines with a fixed voice list never fire it.
    fn on_voices_changed(&self, listener: VoicesChangedListener) {
        let _ = listener;
    }
}

/// Build the engine named by `config.engine`
pub fn from_config(config: &SpeechConfig) -> Result<Arc<dyn SpeechEngine>, SpeechError> {
    match config.engine {
        EngineKind::Web => {
            #[cfg(feature = "web")]
            {
                Ok(Arc::new(web::WebSpeechEngine::new()))
            }
            #[cfg(not(feature = "web"))]
            {
                Err(SpeechError::Config(
                    "Web Speech engine requires the 'web' feature".to_string(),
                ))
            }
        }
        EngineKind::Espeak => {
            #[cfg(not(target_arch = "wasm32"))]
            {
                Ok(Arc::new(espeak::EspeakEngine::with_config(&config.espeak)))
            }
            #[cfg(target_arch = "wasm32")]
            {
                Err(SpeechError::Config(
                    "espeak-ng is not available in the browser".to_string(),
                ))
            }
        }
    }
}
