//! Shared test doubles for parla-spk integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use parla_spk::engines::VoicesChangedListener;
use parla_spk::{FormView, SpeechEngine, SpeechError, Utterance, Voice, VoiceOption};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Engine that records utterances and lets the test resolve them
#[derive(Default)]
pub struct FakeEngine {
    voices: Mutex<Vec<Voice>>,
    listeners: Mutex<Vec<VoicesChangedListener>>,
    spoken: Mutex<Vec<Utterance>>,
    busy: AtomicBool,
    quiet: AtomicBool,
    reject_next: AtomicBool,
    list_calls: AtomicUsize,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_voices(voices: Vec<Voice>) -> Arc<Self> {
        let engine = Self::default();
        *engine.voices.lock() = voices;
        Arc::new(engine)
    }

    /// Replace the engine's list without notifying anyone
    pub fn set_voices(&self, voices: Vec<Voice>) {
        *self.voices.lock() = voices;
    }

    /// Fire the "voices changed" notification
    pub fn fire_voices_changed(&self) {
        for listener in self.listeners.lock().iter() {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Force the engine's busy flag on, regardless of pending utterances
    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
    }

    /// Report idle even while an utterance is unresolved, as a host that
    /// finished speaking but never fired its end event would
    pub fn set_quiet(&self, quiet: bool) {
        self.quiet.store(quiet, Ordering::SeqCst);
    }

    /// Make the next `speak` fail synchronously
    pub fn reject_next(&self) {
        self.reject_next.store(true, Ordering::SeqCst);
    }

    pub fn speak_calls(&self) -> usize {
        self.spoken.lock().len()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Inspect the most recent utterance
    pub fn with_last<R>(&self, f: impl FnOnce(&Utterance) -> R) -> R {
        let spoken = self.spoken.lock();
        f(spoken.last().expect("no utterance spoken"))
    }

    pub fn complete_last(&self) -> bool {
        self.with_last(|u| u.outcome()).complete()
    }

    pub fn fail_last(&self, reason: &str) -> bool {
        self.with_last(|u| u.outcome()).fail(reason)
    }
}

impl SpeechEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn list_voices(&self) -> Result<Vec<Voice>, SpeechError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.voices.lock().clone())
    }

    /// Busy while forced, or while the last utterance has no outcome yet
    fn is_speaking(&self) -> bool {
        if self.quiet.load(Ordering::SeqCst) {
            return false;
        }
        self.busy.load(Ordering::SeqCst)
            || self
                .spoken
                .lock()
                .last()
                .map_or(false, |u| !u.outcome().is_resolved())
    }

    fn speak(&self, utterance: Utterance) -> Result<(), SpeechError> {
        if self.reject_next.swap(false, Ordering::SeqCst) {
            return Err(SpeechError::Engine("synthesis-failed".to_string()));
        }
        self.spoken.lock().push(utterance);
        Ok(())
    }

    fn on_voices_changed(&self, listener: VoicesChangedListener) {
        self.listeners.lock().push(listener);
    }
}

/// In-memory form that records what the binding writes to it
pub struct RecordingView {
    pub text: Mutex<String>,
    pub selected: Mutex<Option<String>>,
    pub rate: Mutex<f32>,
    pub pitch: Mutex<f32>,
    pub rate_readout: Mutex<Option<f32>>,
    pub pitch_readout: Mutex<Option<f32>>,
    pub options: Mutex<Vec<VoiceOption>>,
    pub option_rebuilds: AtomicUsize,
    pub blurs: AtomicUsize,
}

impl RecordingView {
    pub fn new(text: &str) -> Self {
        Self {
            text: Mutex::new(text.to_string()),
            selected: Mutex::new(None),
            rate: Mutex::new(1.0),
            pitch: Mutex::new(1.0),
            rate_readout: Mutex::new(None),
            pitch_readout: Mutex::new(None),
            options: Mutex::new(Vec::new()),
            option_rebuilds: AtomicUsize::new(0),
            blurs: AtomicUsize::new(0),
        }
    }

    pub fn set_text(&self, text: &str) {
        *self.text.lock() = text.to_string();
    }

    pub fn select(&self, name: Option<&str>) {
        *self.selected.lock() = name.map(str::to_string);
    }

    pub fn option_labels(&self) -> Vec<String> {
        self.options.lock().iter().map(|o| o.label.clone()).collect()
    }
}

impl FormView for RecordingView {
    fn text(&self) -> String {
        self.text.lock().clone()
    }

    fn selected_voice(&self) -> Option<String> {
        self.selected.lock().clone()
    }

    fn rate(&self) -> f32 {
        *self.rate.lock()
    }

    fn pitch(&self) -> f32 {
        *self.pitch.lock()
    }

    fn set_rate_readout(&self, value: f32) {
        *self.rate_readout.lock() = Some(value);
    }

    fn set_pitch_readout(&self, value: f32) {
        *self.pitch_readout.lock() = Some(value);
    }

    fn replace_voice_options(&self, options: &[VoiceOption]) {
        *self.options.lock() = options.to_vec();
        self.option_rebuilds.fetch_add(1, Ordering::SeqCst);
    }

    fn blur_text(&self) {
        self.blurs.fetch_add(1, Ordering::SeqCst);
    }
}
