//! Web Speech API engine (`window.speechSynthesis`)

use crate::controller::{OutcomeHandle, Utterance};
use crate::engines::{SpeechEngine, VoicesChangedListener};
use crate::error::SpeechError;
use crate::voice::Voice;
use std::cell::RefCell;
use tracing::debug;
use uuid::Uuid;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Event, SpeechSynthesis, SpeechSynthesisErrorEvent, SpeechSynthesisUtterance,
    SpeechSynthesisVoice,
};

/// JS objects one utterance needs until its end or error event.
///
/// The native utterance is held here so the browser cannot collect it (and
/// silently skip `onend`) while it is still queued.
struct InFlight {
    id: Uuid,
    native: SpeechSynthesisUtterance,
    outcome: OutcomeHandle,
    _on_end: Closure<dyn FnMut(Event)>,
    _on_error: Closure<dyn FnMut(SpeechSynthesisErrorEvent)>,
}

impl InFlight {
    fn detach(&self) {
        self.native.set_onend(None);
        self.native.set_onerror(None);
    }
}

thread_local! {
    static IN_FLIGHT: RefCell<Vec<InFlight>> = RefCell::new(Vec::new());
    // Entries whose callback already ran; freed on the next speak, outside
    // any of their own closures
    static FINISHED: RefCell<Vec<InFlight>> = RefCell::new(Vec::new());
}

/// Move `id` from in-flight to finished once its outcome is resolved
fn retire(id: Uuid) {
    let entry = IN_FLIGHT.with(|in_flight| {
        let mut in_flight = in_flight.borrow_mut();
        let index = in_flight.iter().position(|entry| entry.id == id)?;
        Some(in_flight.swap_remove(index))
    });

    if let Some(entry) = entry {
        entry.detach();
        FINISHED.with(|finished| finished.borrow_mut().push(entry));
    }
}

/// Free finished entries and fail any the idle synthesizer forgot about
fn sweep(synth: &SpeechSynthesis) {
    let finished = FINISHED.with(|finished| std::mem::take(&mut *finished.borrow_mut()));
    drop(finished);

    if synth.speaking() || synth.pending() {
        return;
    }

    let stale = IN_FLIGHT.with(|in_flight| std::mem::take(&mut *in_flight.borrow_mut()));
    for entry in stale {
        debug!(utterance = %entry.id, "Synthesizer idle without an end event");
        entry.detach();
        entry.outcome.fail("speech ended without an end event");
    }
}

/// Number of utterances still holding JS callbacks
pub fn in_flight() -> usize {
    IN_FLIGHT.with(|in_flight| in_flight.borrow().len())
}

/// Engine backed by the page's `speechSynthesis` object.
///
/// Holds no JS handles; the synthesis object is looked up on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSpeechEngine;

impl WebSpeechEngine {
    pub fn new() -> Self {
        Self
    }
}

fn synthesis() -> Result<SpeechSynthesis, SpeechError> {
    let window = web_sys::window()
        .ok_or_else(|| SpeechError::Unavailable("no window".to_string()))?;
    window
        .speech_synthesis()
        .map_err(|_| SpeechError::Unavailable("speechSynthesis is not supported".to_string()))
}

fn js_error(context: &str, value: JsValue) -> SpeechError {
    SpeechError::Engine(format!("{}: {:?}", context, value))
}

fn native_voices(synth: &SpeechSynthesis) -> impl Iterator<Item = SpeechSynthesisVoice> {
    synth
        .get_voices()
        .iter()
        .filter_map(|value| value.dyn_into::<SpeechSynthesisVoice>().ok())
        .collect::<Vec<_>>()
        .into_iter()
}

impl SpeechEngine for WebSpeechEngine {
    fn name(&self) -> &str {
        "web-speech"
    }

    fn is_available(&self) -> bool {
        synthesis().is_ok()
    }

    fn list_voices(&self) -> Result<Vec<Voice>, SpeechError> {
        let synth = synthesis()?;
        Ok(native_voices(&synth)
            .map(|voice| Voice::new(voice.name(), voice.lang()))
            .collect())
    }

    fn is_speaking(&self) -> bool {
        synthesis().map(|synth| synth.speaking()).unwrap_or(false)
    }

    fn speak(&self, utterance: Utterance) -> Result<(), SpeechError> {
        let synth = synthesis()?;
        sweep(&synth);

        let native = SpeechSynthesisUtterance::new_with_text(utterance.text())
            .map_err(|e| js_error("Failed to create utterance", e))?;

        if let Some(voice) = utterance.voice() {
            if let Some(found) = native_voices(&synth).find(|v| v.name() == voice.name) {
                native.set_voice(Some(&found));
            }
        }
        native.set_rate(utterance.rate());
        native.set_pitch(utterance.pitch());

        let id = utterance.id();
        let outcome = utterance.outcome();
        let on_end = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            outcome.complete();
            retire(id);
        });

        let outcome = utterance.outcome();
        let on_error = Closure::<dyn FnMut(SpeechSynthesisErrorEvent)>::new(
            move |event: SpeechSynthesisErrorEvent| {
                outcome.fail(format!("{:?}", event.error()));
                retire(id);
            },
        );

        native.set_onend(Some(on_end.as_ref().unchecked_ref()));
        native.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        IN_FLIGHT.with(|in_flight| {
            in_flight.borrow_mut().push(InFlight {
                id,
                native: native.clone(),
                outcome: utterance.outcome(),
                _on_end: on_end,
                _on_error: on_error,
            })
        });

        synth.speak(&native);
        Ok(())
    }

    fn on_voices_changed(&self, listener: VoicesChangedListener) {
        let Ok(synth) = synthesis() else {
            return;
        };

        let callback = Closure::<dyn FnMut()>::new(move || listener());
        synth.set_onvoiceschanged(Some(callback.as_ref().unchecked_ref()));
        callback.forget();
    }
}
