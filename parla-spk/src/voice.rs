//! Voice snapshot values

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named speech profile exposed by an engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Voice {
    /// Voice name, unique within one catalog snapshot
    pub name: String,

    /// Language tag (e.g. "en-US")
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }

    /// Dropdown label, `"{name} ({lang})"`
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.lang)
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.lang)
    }
}

/// One row of the voice dropdown.
///
/// `name` and `lang` are kept next to the label so the view can store them as
/// option metadata and hand the name back on selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceOption {
    pub label: String,
    pub name: String,
    pub lang: String,
}

impl From<&Voice> for VoiceOption {
    fn from(voice: &Voice) -> Self {
        Self {
            label: voice.label(),
            name: voice.name.clone(),
            lang: voice.lang.clone(),
        }
    }
}
