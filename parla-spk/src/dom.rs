//! Browser host: DOM form view, event wiring and the wasm entry point

use crate::app::SpeechApp;
use crate::config::{EngineKind, FormConfig, SpeechConfig};
use crate::engines::web::WebSpeechEngine;
use crate::error::SpeechError;
use crate::form::{FormEvent, FormView};
use crate::voice::VoiceOption;
use std::sync::Arc;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, HtmlElement, HtmlInputElement, HtmlSelectElement,
    HtmlTextAreaElement,
};

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

/// [`FormView`] over the page's form controls.
///
/// Only element ids are stored; elements are looked up on each access.
#[derive(Debug, Clone)]
pub struct DomForm {
    ids: FormConfig,
}

impl DomForm {
    pub fn new(ids: FormConfig) -> Self {
        Self { ids }
    }

    fn element<T: JsCast>(&self, id: &str) -> Option<T> {
        document()?.get_element_by_id(id)?.dyn_into::<T>().ok()
    }

    fn slider_value(&self, id: &str) -> f32 {
        self.element::<HtmlInputElement>(id)
            .and_then(|input| input.value().parse::<f32>().ok())
            .unwrap_or(1.0)
    }

    fn set_readout(&self, id: &str, value: f32) {
        match self.element::<Element>(id) {
            Some(readout) => readout.set_text_content(Some(&value.to_string())),
            None => warn!("Readout element #{} not found", id),
        }
    }

    fn append_option(&self, document: &Document, select: &HtmlSelectElement, option: &VoiceOption) -> Result<(), JsValue> {
        let element = document.create_element("option")?;
        element.set_text_content(Some(&option.label));
        element.set_attribute("data-lang", &option.lang)?;
        element.set_attribute("data-name", &option.name)?;
        select.append_child(&element)?;
        Ok(())
    }
}

impl FormView for DomForm {
    fn text(&self) -> String {
        if let Some(area) = self.element::<HtmlTextAreaElement>(&self.ids.text_input) {
            return area.value();
        }
        self.element::<HtmlInputElement>(&self.ids.text_input)
            .map(|input| input.value())
            .unwrap_or_default()
    }

    fn selected_voice(&self) -> Option<String> {
        let select = self.element::<HtmlSelectElement>(&self.ids.voice_select)?;
        select.selected_options().item(0)?.get_attribute("data-name")
    }

    fn rate(&self) -> f32 {
        self.slider_value(&self.ids.rate)
    }

    fn pitch(&self) -> f32 {
        self.slider_value(&self.ids.pitch)
    }

    fn set_rate_readout(&self, value: f32) {
        self.set_readout(&self.ids.rate_value, value);
    }

    fn set_pitch_readout(&self, value: f32) {
        self.set_readout(&self.ids.pitch_value, value);
    }

    fn replace_voice_options(&self, options: &[VoiceOption]) {
        let (Some(document), Some(select)) = (
            document(),
            self.element::<HtmlSelectElement>(&self.ids.voice_select),
        ) else {
            warn!("Voice select #{} not found", self.ids.voice_select);
            return;
        };

        select.set_inner_html("");
        for option in options {
            if let Err(e) = self.append_option(&document, &select, option) {
                warn!("Failed to add voice option {}: {:?}", option.label, e);
            }
        }
    }

    fn blur_text(&self) {
        if let Some(field) = self.element::<HtmlElement>(&self.ids.text_input) {
            if let Err(e) = field.blur() {
                warn!("Failed to blur text field: {:?}", e);
            }
        }
    }
}

fn listen<F>(target: &Element, kind: &str, mut handler: F) -> Result<(), SpeechError>
where
    F: FnMut(Event) + 'static,
{
    let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| handler(event));
    target
        .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
        .map_err(|e| SpeechError::Engine(format!("Failed to add {} listener: {:?}", kind, e)))?;
    callback.forget();
    Ok(())
}

fn required(document: &Document, id: &str) -> Result<Element, SpeechError> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| SpeechError::Config(format!("Element #{} not found", id)))
}

/// Wire the form's DOM events into `app`
pub fn install(app: &Arc<SpeechApp<DomForm>>) -> Result<(), SpeechError> {
    let document = document().ok_or_else(|| SpeechError::Unavailable("no document".to_string()))?;
    let ids = &app.config().form;

    let form = document
        .query_selector(&ids.form_selector)
        .ok()
        .flatten()
        .ok_or_else(|| SpeechError::Config(format!("Form '{}' not found", ids.form_selector)))?;

    let submit_app = Arc::clone(app);
    listen(&form, "submit", move |event| {
        event.prevent_default();
        submit_app.handle(FormEvent::Submit);
    })?;

    let bindings = [
        (&ids.rate, FormEvent::RateChanged),
        (&ids.pitch, FormEvent::PitchChanged),
        (&ids.voice_select, FormEvent::VoiceChanged),
    ];
    for (id, form_event) in bindings {
        let element = required(&document, id)?;
        let app = Arc::clone(app);
        listen(&element, "change", move |_| app.handle(form_event))?;
    }

    Ok(())
}

struct ConsoleWriter;

impl std::io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let line = String::from_utf8_lossy(buf);
        web_sys::console::log_1(&JsValue::from_str(line.trim_end()));
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn init_logging() {
    // wasm32 has no wall clock for the default timer
    let _ = tracing_subscriber::fmt()
        .with_writer(|| ConsoleWriter)
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Page entry point: compose the app against `window.speechSynthesis`
#[wasm_bindgen]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    init_logging();

    let config = SpeechConfig {
        engine: EngineKind::Web,
        ..SpeechConfig::default()
    };
    let view = DomForm::new(config.form.clone());

    let app = SpeechApp::new(Arc::new(WebSpeechEngine::new()), view, config)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    install(&Arc::new(app)).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(())
}
