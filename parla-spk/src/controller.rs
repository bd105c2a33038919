//! Single-flight utterance controller
//!
//! [`UtteranceController`] starts an utterance only while the engine reports
//! it is not speaking. Each started utterance carries an [`OutcomeHandle`];
//! resolving it (or dropping it unresolved) publishes exactly one
//! [`SpeechOutcome`] on the broadcast channel returned by
//! [`UtteranceController::subscribe`], after the controller is back to
//! [`SpeechState::Idle`].

use crate::catalog::VoiceCatalog;
use crate::engines::SpeechEngine;
use crate::error::SpeechError;
use crate::voice::Voice;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeechState {
    Idle,
    Speaking,
}

/// What the form asks to have spoken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtteranceRequest {
    pub text: String,

    /// Name of the selected voice; unknown names fall back to the engine default
    pub voice: Option<String>,

    /// Passed to the engine verbatim
    pub rate: f32,

    /// Passed to the engine verbatim
    pub pitch: f32,
}

impl UtteranceRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: None,
            rate: 1.0,
            pitch: 1.0,
        }
    }

    pub fn with_voice(mut self, name: impl Into<String>) -> Self {
        self.voice = Some(name.into());
        self
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }
}

/// Result of one started utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeechOutcome {
    Completed { utterance: Uuid },
    Failed { utterance: Uuid, reason: String },
}

impl SpeechOutcome {
    pub fn utterance_id(&self) -> Uuid {
        match self {
            SpeechOutcome::Completed { utterance } => *utterance,
            SpeechOutcome::Failed { utterance, .. } => *utterance,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SpeechOutcome::Completed { .. })
    }
}

type OutcomeSink = Box<dyn FnOnce(SpeechOutcome) + Send>;

/// Reason published when an utterance is dropped unresolved
pub const DROPPED_REASON: &str = "utterance dropped before the engine reported an outcome";

struct OutcomeSlot {
    utterance: Uuid,
    sink: Mutex<Option<OutcomeSink>>,
}

impl OutcomeSlot {
    fn resolve(&self, outcome: SpeechOutcome) -> bool {
        // Take the sink before running it so it never runs under the lock
        let sink = self.sink.lock().take();
        match sink {
            Some(sink) => {
                sink(outcome);
                true
            }
            None => {
                debug!(utterance = %self.utterance, "Ignoring repeated outcome");
                false
            }
        }
    }
}

impl Drop for OutcomeSlot {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.get_mut().take() {
            warn!(utterance = %self.utterance, "Utterance dropped without an outcome");
            sink(SpeechOutcome::Failed {
                utterance: self.utterance,
                reason: DROPPED_REASON.to_string(),
            });
        }
    }
}

/// Completion slot shared between an utterance and its engine callbacks.
///
/// Clones share one slot: the first `complete` or `fail` wins and every later
/// call is a no-op, so an engine may wire the same handle to both its end and
/// error notifications. When the last clone is dropped unresolved the slot
/// fails with [`DROPPED_REASON`].
#[derive(Clone)]
pub struct OutcomeHandle {
    slot: Arc<OutcomeSlot>,
}

impl OutcomeHandle {
    fn new(utterance: Uuid, sink: OutcomeSink) -> Self {
        Self {
            slot: Arc::new(OutcomeSlot {
                utterance,
                sink: Mutex::new(Some(sink)),
            }),
        }
    }

    /// Report successful completion; returns false if already resolved
    pub fn complete(&self) -> bool {
        self.slot.resolve(SpeechOutcome::Completed {
            utterance: self.slot.utterance,
        })
    }

    /// Report a failure; returns false if already resolved
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.slot.resolve(SpeechOutcome::Failed {
            utterance: self.slot.utterance,
            reason: reason.into(),
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.sink.lock().is_none()
    }
}

impl fmt::Debug for OutcomeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutcomeHandle")
            .field("utterance", &self.slot.utterance)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// One speak attempt as handed to an engine
#[derive(Debug)]
pub struct Utterance {
    id: Uuid,
    text: String,
    voice: Option<Voice>,
    rate: f32,
    pitch: f32,
    outcome: OutcomeHandle,
}

impl Utterance {
    pub fn new<F>(text: impl Into<String>, voice: Option<Voice>, rate: f32, pitch: f32, on_outcome: F) -> Self
    where
        F: FnOnce(SpeechOutcome) + Send + 'static,
    {
        let id = Uuid::new_v4();
        Self {
            id,
            text: text.into(),
            voice,
            rate,
            pitch,
            outcome: OutcomeHandle::new(id, Box::new(on_outcome)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// `None` means the engine's default voice
    pub fn voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Handle the engine resolves when speech ends or fails
    pub fn outcome(&self) -> OutcomeHandle {
        self.outcome.clone()
    }
}

/// Enforces the single-utterance-in-flight rule and dispatches to the engine.
///
/// The engine's own busy flag decides whether a request may start. The
/// controller only tracks which utterance it last started so that
/// [`state`](Self::state) can report it until its outcome arrives.
pub struct UtteranceController {
    engine: Arc<dyn SpeechEngine>,
    catalog: Arc<VoiceCatalog>,
    dispatch: Mutex<()>,
    active: Arc<Mutex<Option<Uuid>>>,
    events: broadcast::Sender<SpeechOutcome>,
}

impl UtteranceController {
    pub fn new(engine: Arc<dyn SpeechEngine>, catalog: Arc<VoiceCatalog>, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            engine,
            catalog,
            dispatch: Mutex::new(()),
            active: Arc::new(Mutex::new(None)),
            events,
        }
    }

    pub fn state(&self) -> SpeechState {
        if self.active.lock().is_some() {
            SpeechState::Speaking
        } else {
            SpeechState::Idle
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.state() == SpeechState::Speaking
    }

    /// Receive every outcome published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<SpeechOutcome> {
        self.events.subscribe()
    }

    /// Start speaking `request`.
    ///
    /// Returns the utterance id once the engine has accepted it. Requests made
    /// while the engine reports speaking, and blank requests, are rejected
    /// without touching the engine. A synchronous engine failure returns the
    /// controller to Idle, publishes one [`SpeechOutcome::Failed`], and is
    /// returned to the caller.
    pub fn speak(&self, request: UtteranceRequest) -> Result<Uuid, SpeechError> {
        // Serializes the busy check with the hand-off to the engine
        let _dispatch = self.dispatch.lock();

        if self.engine.is_speaking() {
            debug!("The app is already speaking");
            return Err(SpeechError::AlreadySpeaking);
        }

        if request.text.trim().is_empty() {
            debug!("Message cannot be blank");
            return Err(SpeechError::EmptyText);
        }

        let voice = self.resolve_voice(request.voice.as_deref());
        let utterance = Utterance::new(request.text, voice, request.rate, request.pitch, self.outcome_sink());
        let id = utterance.id();
        let outcome = utterance.outcome();

        if let Some(stale) = self.active.lock().replace(id) {
            debug!(utterance = %stale, "Engine idle but no outcome yet; superseding");
        }

        info!(
            utterance = %id,
            engine = self.engine.name(),
            voice = utterance.voice().map(|v| v.name.as_str()).unwrap_or("default"),
            rate = utterance.rate(),
            pitch = utterance.pitch(),
            "Speaking"
        );

        if let Err(e) = self.engine.speak(utterance) {
            outcome.fail(e.to_string());
            return Err(e);
        }

        Ok(id)
    }

    /// Exact-name lookup; a miss leaves the engine default in place
    fn resolve_voice(&self, name: Option<&str>) -> Option<Voice> {
        let name = name?;
        let voice = self.catalog.find(name);
        if voice.is_none() {
            debug!(voice = name, "Voice not in catalog, using engine default");
        }
        voice
    }

    fn outcome_sink(&self) -> impl FnOnce(SpeechOutcome) + Send + 'static {
        let active = Arc::clone(&self.active);
        let events = self.events.clone();

        move |outcome: SpeechOutcome| {
            // Listeners must observe Idle, so reset before publishing
            {
                let mut active = active.lock();
                if *active == Some(outcome.utterance_id()) {
                    *active = None;
                }
            }

            match &outcome {
                SpeechOutcome::Completed { utterance } => {
                    info!(utterance = %utterance, "Speaking is complete");
                }
                SpeechOutcome::Failed { utterance, reason } => {
                    error!(utterance = %utterance, "There was an error with speaking: {}", reason);
                }
            }

            if events.send(outcome).is_err() {
                debug!("No outcome listeners");
            }
        }
    }
}
