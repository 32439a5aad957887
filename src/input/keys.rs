//! Physical key identity and the shared set of currently held keys.
//!
//! `PhysicalKey` is the stable identity a profile binds against. It is
//! derived from raw listener events by [`PhysicalKey::from_key`], which maps
//! the physical key rather than the produced character, so the same key
//! yields the same identity on the press and release edges regardless of
//! modifier state.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Identity of one key on the physical keyboard.
///
/// Serialized as a tagged string so profiles stay human readable:
/// `KEY:Escape`, `VK:113`, `CHAR:w`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PhysicalKey {
    /// Named non-printable key, e.g. "Escape" or "F5".
    Named(String),
    /// Platform virtual key code the listener could not classify.
    Code(u32),
    /// Literal character key.
    Char(char),
}

/// A tagged key string that could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized key tag: {0:?}")]
pub struct KeyParseError(pub String);

impl PhysicalKey {
    /// Canonical identity for a raw listener key.
    ///
    /// Letter and digit keys become `Char` (lowercase, layout independent of
    /// held modifiers), unidentified platform codes become `Code`, everything
    /// else keeps its listener name.
    pub fn from_key(key: rdev::Key) -> Self {
        use rdev::Key::*;
        let ch = match key {
            KeyA => 'a',
            KeyB => 'b',
            KeyC => 'c',
            KeyD => 'd',
            KeyE => 'e',
            KeyF => 'f',
            KeyG => 'g',
            KeyH => 'h',
            KeyI => 'i',
            KeyJ => 'j',
            KeyK => 'k',
            KeyL => 'l',
            KeyM => 'm',
            KeyN => 'n',
            KeyO => 'o',
            KeyP => 'p',
            KeyQ => 'q',
            KeyR => 'r',
            KeyS => 's',
            KeyT => 't',
            KeyU => 'u',
            KeyV => 'v',
            KeyW => 'w',
            KeyX => 'x',
            KeyY => 'y',
            KeyZ => 'z',
            Num0 => '0',
            Num1 => '1',
            Num2 => '2',
            Num3 => '3',
            Num4 => '4',
            Num5 => '5',
            Num6 => '6',
            Num7 => '7',
            Num8 => '8',
            Num9 => '9',
            Unknown(code) => return PhysicalKey::Code(code),
            other => return PhysicalKey::Named(format!("{other:?}")),
        };
        PhysicalKey::Char(ch)
    }
}

impl fmt::Display for PhysicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalKey::Named(name) => write!(f, "KEY:{name}"),
            PhysicalKey::Code(code) => write!(f, "VK:{code}"),
            PhysicalKey::Char(ch) => write!(f, "CHAR:{ch}"),
        }
    }
}

impl FromStr for PhysicalKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(name) = s.strip_prefix("KEY:") {
            if name.is_empty() {
                return Err(KeyParseError(s.to_string()));
            }
            return Ok(PhysicalKey::Named(name.to_string()));
        }
        if let Some(code) = s.strip_prefix("VK:") {
            return code
                .parse::<u32>()
                .map(PhysicalKey::Code)
                .map_err(|_| KeyParseError(s.to_string()));
        }
        if let Some(ch) = s.strip_prefix("CHAR:") {
            let mut chars = ch.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(PhysicalKey::Char(c)),
                _ => Err(KeyParseError(s.to_string())),
            };
        }
        Err(KeyParseError(s.to_string()))
    }
}

impl Serialize for PhysicalKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PhysicalKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

/// Set of keys currently held down.
///
/// Written by the listener thread, read by the mapping loop. Both sides go
/// through the internal mutex, so neither needs external locking.
#[derive(Clone, Debug, Default)]
pub struct KeyState {
    held: Arc<Mutex<HashSet<PhysicalKey>>>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_down(&self, key: PhysicalKey) {
        self.lock().insert(key);
    }

    pub fn record_up(&self, key: &PhysicalKey) {
        self.lock().remove(key);
    }

    /// Whether a bound key is currently held. Unmapped bindings are never down.
    pub fn is_down(&self, key: Option<&PhysicalKey>) -> bool {
        match key {
            Some(key) => self.lock().contains(key),
            None => false,
        }
    }

    /// Owned copy of the held set for one mapping cycle.
    pub fn snapshot(&self) -> KeySnapshot {
        KeySnapshot(self.lock().clone())
    }

    /// Drops all held keys, used when listener routing is torn down so no
    /// key stays latched across runs.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<PhysicalKey>> {
        // A panicked writer cannot leave the set inconsistent, recover it.
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Immutable view of the held keys taken at the start of a cycle.
#[derive(Debug, Clone, Default)]
pub struct KeySnapshot(HashSet<PhysicalKey>);

impl KeySnapshot {
    pub fn is_down(&self, key: Option<&PhysicalKey>) -> bool {
        match key {
            Some(key) => self.0.contains(key),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<PhysicalKey> for KeySnapshot {
    fn from_iter<I: IntoIterator<Item = PhysicalKey>>(iter: I) -> Self {
        KeySnapshot(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_strings_round_trip() {
        for key in [
            PhysicalKey::Named("Escape".to_string()),
            PhysicalKey::Named("Backspace".to_string()),
            PhysicalKey::Code(113),
            PhysicalKey::Char('w'),
            PhysicalKey::Char(';'),
        ] {
            let tag = key.to_string();
            assert_eq!(tag.parse::<PhysicalKey>().unwrap(), key);
        }
    }

    #[test]
    fn junk_tags_are_rejected() {
        for junk in ["", "KEY:", "VK:notanumber", "CHAR:", "CHAR:ab", "MOUSE:1", "esc"] {
            assert!(junk.parse::<PhysicalKey>().is_err(), "{junk:?} should not parse");
        }
    }

    #[test]
    fn canonical_form_is_stable_for_letters_and_digits() {
        assert_eq!(PhysicalKey::from_key(rdev::Key::KeyW), PhysicalKey::Char('w'));
        assert_eq!(PhysicalKey::from_key(rdev::Key::Num3), PhysicalKey::Char('3'));
        assert_eq!(
            PhysicalKey::from_key(rdev::Key::Escape),
            PhysicalKey::Named("Escape".to_string())
        );
        assert_eq!(PhysicalKey::from_key(rdev::Key::Unknown(113)), PhysicalKey::Code(113));
    }

    #[test]
    fn key_state_tracks_membership() {
        let state = KeyState::new();
        let w = PhysicalKey::Char('w');

        assert!(!state.is_down(Some(&w)));
        state.record_down(w.clone());
        assert!(state.is_down(Some(&w)));
        state.record_up(&w);
        assert!(!state.is_down(Some(&w)));
    }

    #[test]
    fn unmapped_binding_is_never_down() {
        let state = KeyState::new();
        state.record_down(PhysicalKey::Char('w'));
        assert!(!state.is_down(None));
    }

    #[test]
    fn duplicate_edges_are_harmless() {
        let state = KeyState::new();
        let w = PhysicalKey::Char('w');

        state.record_down(w.clone());
        state.record_down(w.clone());
        assert!(state.is_down(Some(&w)));

        state.record_up(&w);
        state.record_up(&w);
        assert!(!state.is_down(Some(&w)));
    }

    #[test]
    fn snapshot_is_detached_from_later_updates() {
        let state = KeyState::new();
        let w = PhysicalKey::Char('w');
        state.record_down(w.clone());

        let snap = state.snapshot();
        state.record_up(&w);

        assert!(snap.is_down(Some(&w)));
        assert!(!state.is_down(Some(&w)));
    }

    #[test]
    fn clear_releases_everything() {
        let state = KeyState::new();
        state.record_down(PhysicalKey::Char('w'));
        state.record_down(PhysicalKey::Named("Escape".to_string()));
        state.clear();
        assert!(state.snapshot().is_empty());
    }
}
