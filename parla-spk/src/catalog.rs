//! Voice catalog synchronized with the engine's voice list

use crate::engines::SpeechEngine;
use crate::voice::Voice;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Receives every new snapshot after a refresh
pub type SnapshotListener = Box<dyn Fn(&[Voice]) + Send + Sync>;

/// Current set of voices exposed by the engine.
///
/// The snapshot is replaced wholesale on every [`refresh`](Self::refresh).
/// Many hosts load voices asynchronously, so the first refresh may come back
/// empty and a later "voices changed" notification fills it in.
pub struct VoiceCatalog {
    engine: Arc<dyn SpeechEngine>,
    voices: RwLock<Vec<Voice>>,
    listeners: RwLock<Vec<SnapshotListener>>,
}

impl VoiceCatalog {
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        Self {
            engine,
            voices: RwLock::new(Vec::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Re-query the engine, replace the snapshot, and notify listeners.
    ///
    /// Listeners run while the listener list is read-locked and must not call
    /// [`subscribe`](Self::subscribe).
    pub fn refresh(&self) -> Vec<Voice> {
        let voices = match self.engine.list_voices() {
            Ok(voices) => voices,
            Err(e) => {
                warn!(engine = self.engine.name(), "Failed to list voices: {}", e);
                Vec::new()
            }
        };

        *self.voices.write() = voices.clone();
        debug!(count = voices.len(), "Voice catalog refreshed");

        for listener in self.listeners.read().iter() {
            listener(&voices);
        }

        voices
    }

    /// Register for snapshots produced by later refreshes
    pub fn subscribe(&self, listener: SnapshotListener) {
        self.listeners.write().push(listener);
    }

    /// Refresh whenever the engine reports that its voice list changed
    pub fn attach(self: &Arc<Self>) {
        let catalog = Arc::downgrade(self);
        self.engine.on_voices_changed(Box::new(move || {
            if let Some(catalog) = catalog.upgrade() {
                catalog.refresh();
            }
        }));
    }

    pub fn snapshot(&self) -> Vec<Voice> {
        self.voices.read().clone()
    }

    /// Exact name match against the current snapshot
    pub fn find(&self, name: &str) -> Option<Voice> {
        self.voices.read().iter().find(|v| v.name == name).cloned()
    }

    pub fn len(&self) -> usize {
        self.voices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.read().is_empty()
    }
}
