//! espeak-ng engine for native hosts
//!
//! Speech is played straight to the audio device by an `espeak-ng` child
//! process. The child is awaited on the ambient tokio runtime and its exit
//! status resolves the utterance outcome.

use crate::config::EspeakConfig;
use crate::controller::Utterance;
use crate::engines::SpeechEngine;
use crate::error::SpeechError;
use crate::voice::Voice;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::runtime::RuntimeFlavor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const MIN_WPM: f32 = 80.0;
const MAX_WPM: f32 = 450.0;
const MAX_VOICES: usize = 1000;

/// espeak-ng command line engine
pub struct EspeakEngine {
    binary: Option<PathBuf>,
    base_wpm: u32,
    base_pitch: u8,
    speaking: Arc<AtomicBool>,
    /// Voice name to espeak voice file, from the last `--voices` listing
    identifiers: RwLock<HashMap<String, String>>,
}

/// One row of `espeak-ng --voices`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EspeakVoice {
    pub voice: Voice,
    /// Value of the `File` column, accepted by `-v`
    pub file: String,
}

/// Clears the busy flag when the child's waiter finishes or is dropped
struct SpeakingGuard(Arc<AtomicBool>);

impl SpeakingGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for SpeakingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl EspeakEngine {
    pub fn new() -> Self {
        Self::with_config(&EspeakConfig::default())
    }

    /// Use the configured binary if it exists, otherwise search `PATH`
    pub fn with_config(config: &EspeakConfig) -> Self {
        let binary = config
            .binary
            .clone()
            .filter(|p| p.exists())
            .or_else(|| find_in_path("espeak-ng"))
            .or_else(|| find_in_path("espeak"));

        match binary {
            Some(ref bin) => info!(bin = ?bin, "Detected espeak-ng binary"),
            None => warn!("espeak-ng not found; speech will be unavailable"),
        }

        Self::with_binary(binary, config)
    }

    /// Use exactly `binary`, without searching `PATH`
    pub fn with_binary(binary: Option<PathBuf>, config: &EspeakConfig) -> Self {
        Self {
            binary,
            base_wpm: config.base_wpm,
            base_pitch: config.base_pitch,
            speaking: Arc::new(AtomicBool::new(false)),
            identifiers: RwLock::new(HashMap::new()),
        }
    }

    pub fn binary(&self) -> Option<&Path> {
        self.binary.as_deref()
    }

    /// Map a rate multiplier (1.0 = normal) to espeak words per minute
    pub fn words_per_minute(&self, rate: f32) -> u32 {
        let wpm = self.base_wpm as f32 * rate;
        if wpm.is_finite() {
            wpm.round().clamp(MIN_WPM, MAX_WPM) as u32
        } else {
            self.base_wpm
        }
    }

    /// Map a pitch multiplier (1.0 = normal) to espeak's 0-99 scale
    pub fn espeak_pitch(&self, pitch: f32) -> u8 {
        let value = self.base_pitch as f32 * pitch;
        if value.is_finite() {
            value.round().clamp(0.0, 99.0) as u8
        } else {
            self.base_pitch
        }
    }

    /// The voice file for `voice`, or its language if it was never listed
    pub fn voice_identifier(&self, voice: &Voice) -> String {
        self.identifiers
            .read()
            .get(&voice.name)
            .cloned()
            .unwrap_or_else(|| voice.lang.clone())
    }

    /// Arguments for one utterance, text last after `--`
    pub fn command_args(&self, utterance: &Utterance) -> Vec<String> {
        let mut args = Vec::with_capacity(8);

        if let Some(voice) = utterance.voice() {
            args.push("-v".to_string());
            args.push(self.voice_identifier(voice));
        }

        args.push("-s".to_string());
        args.push(self.words_per_minute(utterance.rate()).to_string());
        args.push("-p".to_string());
        args.push(self.espeak_pitch(utterance.pitch()).to_string());

        // Newlines become spaces; other control characters are dropped
        let text: String = utterance
            .text()
            .chars()
            .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
            .filter(|c| !c.is_control())
            .collect();

        args.push("--".to_string());
        args.push(text);
        args
    }
}

impl Default for EspeakEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechEngine for EspeakEngine {
    fn name(&self) -> &str {
        "espeak-ng"
    }

    fn is_available(&self) -> bool {
        self.binary.is_some()
    }

    /// Runs `espeak-ng --voices` and waits for it.
    ///
    /// This blocks the calling thread; on a multi-threaded tokio runtime the
    /// worker is handed off with `block_in_place` first.
    fn list_voices(&self) -> Result<Vec<Voice>, SpeechError> {
        let binary = self
            .binary
            .as_ref()
            .ok_or_else(|| SpeechError::Unavailable("espeak-ng not found".to_string()))?;

        let output = run_blocking(|| std::process::Command::new(binary).arg("--voices").output())
            .map_err(|e| SpeechError::Engine(format!("Failed to list voices: {}", e)))?;

        if !output.status.success() {
            return Err(SpeechError::Engine(format!(
                "espeak-ng --voices failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let listed = parse_voice_list(&String::from_utf8_lossy(&output.stdout));
        *self.identifiers.write() = listed
            .iter()
            .map(|v| (v.voice.name.clone(), v.file.clone()))
            .collect();

        Ok(listed.into_iter().map(|v| v.voice).collect())
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    fn speak(&self, utterance: Utterance) -> Result<(), SpeechError> {
        let binary = self
            .binary
            .clone()
            .ok_or_else(|| SpeechError::Unavailable("espeak-ng not found".to_string()))?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            SpeechError::Engine(
                "No tokio runtime available. espeak-ng must be driven from within a tokio runtime context."
                    .to_string(),
            )
        })?;
        let _guard = runtime.enter();

        let args = self.command_args(&utterance);
        let child = tokio::process::Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SpeechError::Engine(format!("Failed to run espeak-ng: {}", e)))?;

        debug!(utterance = %utterance.id(), pid = ?child.id(), "espeak-ng started");

        // Both the guard and the outcome live in the task; if the runtime
        // drops it, the flag clears and the outcome fails on drop
        let speaking = SpeakingGuard::acquire(&self.speaking);
        let outcome = utterance.outcome();
        drop(utterance);
        runtime.spawn(async move {
            let result = child.wait_with_output().await;
            drop(speaking);

            match result {
                Ok(output) if output.status.success() => {
                    outcome.complete();
                }
                Ok(output) => {
                    outcome.fail(format!(
                        "espeak-ng exited with {}: {}",
                        output.status,
                        String::from_utf8_lossy(&output.stderr).trim()
                    ));
                }
                Err(e) => {
                    outcome.fail(format!("Failed to wait for espeak-ng: {}", e));
                }
            }
        });

        Ok(())
    }
}

/// Parse `espeak-ng --voices` output.
///
/// Columns are `Pty Language Age/Gender VoiceName File Other...`; the header
/// line is skipped and short lines are ignored.
pub fn parse_voice_list(output: &str) -> Vec<EspeakVoice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() < 5 {
                return None;
            }
            let (lang, name, file) = (columns[1], columns[3], columns[4]);
            if name.chars().any(|c| c == '\0' || c.is_control()) {
                warn!("Voice name contains invalid characters, skipping: {}", name);
                return None;
            }
            Some(EspeakVoice {
                voice: Voice::new(name, lang),
                file: file.to_string(),
            })
        })
        .take(MAX_VOICES)
        .collect()
}

/// Run blocking work without stalling a multi-threaded runtime's worker
fn run_blocking<R>(f: impl FnOnce() -> R) -> R {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

fn find_in_path(bin: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(bin))
        .find(|candidate| candidate.is_file())
}
