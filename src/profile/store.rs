//! Profile persistence as flat JSON documents.
//!
//! Saving always writes every known field. Loading is lenient: the document
//! is parsed into a value tree and recognized fields are merged over
//! defaults one by one, so a malformed binding degrades to its default with
//! a warning instead of rejecting the whole profile. Unknown fields are
//! ignored.

use super::{KeySlot, Profile};
use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("profile file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("profile document error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes `profile` as pretty JSON with every known field present.
pub fn save_profile(path: &Path, profile: &Profile) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let doc = serde_json::to_string_pretty(profile)?;
    fs::write(path, doc)?;
    info!("profile saved to {}", path.display());
    Ok(())
}

/// Loads a profile document, merging recognized fields over defaults.
///
/// Only an unreadable file or a document that is not JSON at all is an
/// error; anything wrong with individual fields is recovered.
pub fn load_profile(path: &Path) -> Result<Profile, StoreError> {
    let content = fs::read_to_string(path)?;
    let doc: Value = serde_json::from_str(&content)?;
    info!("profile loaded from {}", path.display());
    Ok(merge_document(doc))
}

/// Merges a parsed document over [`Profile::default`].
pub fn merge_document(doc: Value) -> Profile {
    let mut profile = Profile::default();
    let Value::Object(mut fields) = doc else {
        warn!("profile document is not an object, using defaults");
        return profile;
    };

    for (name, slot) in profile.slots_mut() {
        let Some(value) = fields.remove(name) else {
            continue;
        };
        match serde_json::from_value::<KeySlot>(value) {
            Ok(parsed) => *slot = parsed,
            Err(e) => warn!("ignoring malformed binding {name}: {e}"),
        }
    }

    if let Some(value) = fields.remove("EXIT_HOLD_SEC") {
        match serde_json::from_value::<f32>(value) {
            Ok(secs) if secs.is_finite() && secs >= 0.0 => profile.exit_hold_secs = secs,
            Ok(secs) => warn!("ignoring out-of-range EXIT_HOLD_SEC: {secs}"),
            Err(e) => warn!("ignoring malformed EXIT_HOLD_SEC: {e}"),
        }
    }
    if let Some(value) = fields.remove("STICK_MAGNITUDE") {
        match serde_json::from_value::<f32>(value) {
            Ok(mag) if mag.is_finite() => profile.stick_magnitude = mag.clamp(0.0, 1.0),
            Ok(mag) => warn!("ignoring out-of-range STICK_MAGNITUDE: {mag}"),
            Err(e) => warn!("ignoring malformed STICK_MAGNITUDE: {e}"),
        }
    }

    for name in fields.keys() {
        debug!("ignoring unknown profile field {name}");
    }

    profile
}
