//! Startup composition of catalog, controller and form binding

use crate::catalog::VoiceCatalog;
use crate::config::SpeechConfig;
use crate::controller::UtteranceController;
use crate::engines::SpeechEngine;
use crate::error::SpeechError;
use crate::form::{FormBinding, FormEvent, FormView};
use crate::voice::Voice;
use std::sync::Arc;
use tracing::{info, warn};

/// Page-lifetime context owning every component
pub struct SpeechApp<V: FormView + 'static> {
    config: Arc<SpeechConfig>,
    catalog: Arc<VoiceCatalog>,
    controller: Arc<UtteranceController>,
    binding: Arc<FormBinding<V>>,
}

impl<V: FormView + 'static> SpeechApp<V> {
    /// Build and render the app.
    ///
    /// The catalog is refreshed before the binding's first render; later
    /// "voices changed" notifications repopulate the dropdown.
    pub fn new(engine: Arc<dyn SpeechEngine>, view: V, config: SpeechConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Config)?;

        if !engine.is_available() {
            warn!(engine = engine.name(), "Speech engine not available");
        }

        let catalog = Arc::new(VoiceCatalog::new(Arc::clone(&engine)));
        catalog.refresh();

        let controller = Arc::new(UtteranceController::new(
            Arc::clone(&engine),
            Arc::clone(&catalog),
            config.event_capacity,
        ));
        let binding = Arc::new(FormBinding::new(view, Arc::clone(&controller)));

        let listener = Arc::downgrade(&binding);
        catalog.subscribe(Box::new(move |voices: &[Voice]| {
            if let Some(binding) = listener.upgrade() {
                binding.on_voices_refreshed(voices);
            }
        }));
        catalog.attach();

        binding.render(&catalog.snapshot());
        info!(engine = engine.name(), voices = catalog.len(), "Speech app ready");

        Ok(Self {
            config: Arc::new(config),
            catalog,
            controller,
            binding,
        })
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<VoiceCatalog> {
        &self.catalog
    }

    pub fn controller(&self) -> &Arc<UtteranceController> {
        &self.controller
    }

    pub fn binding(&self) -> &Arc<FormBinding<V>> {
        &self.binding
    }

    pub fn handle(&self, event: FormEvent) {
        self.binding.handle(event);
    }
}
