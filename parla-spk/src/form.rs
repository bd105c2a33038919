//! Form binding: the only code that touches the UI controls

use crate::controller::{UtteranceController, UtteranceRequest};
use crate::error::SpeechError;
use crate::voice::{Voice, VoiceOption};
use std::sync::Arc;
use tracing::trace;
use uuid::Uuid;

/// The controls of the speak form
pub trait FormView: Send + Sync {
    /// Current contents of the text field
    fn text(&self) -> String;

    /// Name stored on the selected dropdown option, if any
    fn selected_voice(&self) -> Option<String>;

    fn rate(&self) -> f32;

    fn pitch(&self) -> f32;

    fn set_rate_readout(&self, value: f32);

    fn set_pitch_readout(&self, value: f32);

    /// Clear the dropdown and fill it with `options`, in order
    fn replace_voice_options(&self, options: &[VoiceOption]);

    /// Drop input focus from the text field
    fn blur_text(&self);
}

/// User actions routed from the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEvent {
    Submit,
    RateChanged,
    PitchChanged,
    VoiceChanged,
}

/// Routes form events into controller calls and catalog snapshots into the view
pub struct FormBinding<V: FormView> {
    view: V,
    controller: Arc<UtteranceController>,
}

impl<V: FormView> FormBinding<V> {
    pub fn new(view: V, controller: Arc<UtteranceController>) -> Self {
        Self { view, controller }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Dispatch one event.
    ///
    /// Rejected or failed speak attempts are only logged; the form takes no
    /// corrective action.
    pub fn handle(&self, event: FormEvent) {
        let result = match event {
            FormEvent::Submit => self.on_submit(),
            FormEvent::VoiceChanged => self.on_voice_changed(),
            FormEvent::RateChanged => {
                self.on_rate_changed();
                return;
            }
            FormEvent::PitchChanged => {
                self.on_pitch_changed();
                return;
            }
        };

        if let Err(e) = result {
            trace!(?event, "Speak not started: {}", e);
        }
    }

    /// Speak the current form values, then blur the text field
    pub fn on_submit(&self) -> Result<Uuid, SpeechError> {
        let result = self.controller.speak(self.request());
        self.view.blur_text();
        result
    }

    /// Changing the voice immediately re-speaks the current text
    pub fn on_voice_changed(&self) -> Result<Uuid, SpeechError> {
        self.controller.speak(self.request())
    }

    pub fn on_rate_changed(&self) {
        self.view.set_rate_readout(self.view.rate());
    }

    pub fn on_pitch_changed(&self) {
        self.view.set_pitch_readout(self.view.pitch());
    }

    /// Rebuild the dropdown from scratch
    pub fn on_voices_refreshed(&self, voices: &[Voice]) {
        let options: Vec<VoiceOption> = voices.iter().map(VoiceOption::from).collect();
        self.view.replace_voice_options(&options);
    }

    /// Initial paint: dropdown from `voices`, readouts from the sliders
    pub fn render(&self, voices: &[Voice]) {
        self.on_voices_refreshed(voices);
        self.on_rate_changed();
        self.on_pitch_changed();
    }

    fn request(&self) -> UtteranceRequest {
        UtteranceRequest {
            text: self.view.text(),
            voice: self.view.selected_voice(),
            rate: self.view.rate(),
            pitch: self.view.pitch(),
        }
    }
}
