//! Profile data model: which key drives which pad control, plus tunables.
//!
//! A profile is a flat document. Every control has exactly one slot, every
//! slot holds at most one key, and absence means unmapped. The serialized
//! field names are part of the on-disk format and never change.

pub mod portal;
pub mod store;

pub use portal::{PortalError, ProfilePortal};
pub use store::{load_profile, save_profile, StoreError};

use crate::input::PhysicalKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One binding slot. Serializes as the tagged key string, `""` when unmapped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeySlot(Option<PhysicalKey>);

impl KeySlot {
    pub fn bound(key: PhysicalKey) -> Self {
        KeySlot(Some(key))
    }

    pub fn key(&self) -> Option<&PhysicalKey> {
        self.0.as_ref()
    }

    pub fn set(&mut self, key: PhysicalKey) {
        self.0 = Some(key);
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn is_unmapped(&self) -> bool {
        self.0.is_none()
    }

    /// Human readable form for the configuration surface.
    pub fn label(&self) -> String {
        match &self.0 {
            None => "(unmapped)".to_string(),
            Some(PhysicalKey::Named(name)) => format!("Key.{name}"),
            Some(PhysicalKey::Code(code)) => format!("VK {code}"),
            Some(PhysicalKey::Char(ch)) => format!("'{ch}'"),
        }
    }
}

impl Serialize for KeySlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(key) => key.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }
}

impl<'de> Deserialize<'de> for KeySlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        if tag.is_empty() {
            return Ok(KeySlot(None));
        }
        tag.parse()
            .map(|key| KeySlot(Some(key)))
            .map_err(serde::de::Error::custom)
    }
}

/// Complete key-to-control mapping with tunable parameters.
///
/// The loop borrows a snapshot of this every cycle; all writes come from the
/// configuration surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    #[serde(rename = "A")]
    pub a: KeySlot,
    #[serde(rename = "B")]
    pub b: KeySlot,
    #[serde(rename = "X")]
    pub x: KeySlot,
    #[serde(rename = "Y")]
    pub y: KeySlot,
    #[serde(rename = "LB")]
    pub lb: KeySlot,
    #[serde(rename = "RB")]
    pub rb: KeySlot,
    #[serde(rename = "BACK")]
    pub back: KeySlot,
    #[serde(rename = "START")]
    pub start: KeySlot,
    #[serde(rename = "LS_CLICK")]
    pub ls_click: KeySlot,
    #[serde(rename = "RS_CLICK")]
    pub rs_click: KeySlot,
    #[serde(rename = "DPAD_UP")]
    pub dpad_up: KeySlot,
    #[serde(rename = "DPAD_DOWN")]
    pub dpad_down: KeySlot,
    #[serde(rename = "DPAD_LEFT")]
    pub dpad_left: KeySlot,
    #[serde(rename = "DPAD_RIGHT")]
    pub dpad_right: KeySlot,

    #[serde(rename = "LEFT_STICK_UP")]
    pub left_stick_up: KeySlot,
    #[serde(rename = "LEFT_STICK_DOWN")]
    pub left_stick_down: KeySlot,
    #[serde(rename = "LEFT_STICK_LEFT")]
    pub left_stick_left: KeySlot,
    #[serde(rename = "LEFT_STICK_RIGHT")]
    pub left_stick_right: KeySlot,
    #[serde(rename = "RIGHT_STICK_UP")]
    pub right_stick_up: KeySlot,
    #[serde(rename = "RIGHT_STICK_DOWN")]
    pub right_stick_down: KeySlot,
    #[serde(rename = "RIGHT_STICK_LEFT")]
    pub right_stick_left: KeySlot,
    #[serde(rename = "RIGHT_STICK_RIGHT")]
    pub right_stick_right: KeySlot,

    #[serde(rename = "LT")]
    pub lt: KeySlot,
    #[serde(rename = "RT")]
    pub rt: KeySlot,

    #[serde(rename = "EXIT_KEY_1")]
    pub exit_key_1: KeySlot,
    #[serde(rename = "EXIT_KEY_2")]
    pub exit_key_2: KeySlot,
    #[serde(rename = "EXIT_HOLD_SEC")]
    pub exit_hold_secs: f32,
    #[serde(rename = "STICK_MAGNITUDE")]
    pub stick_magnitude: f32,
}

impl Default for Profile {
    fn default() -> Self {
        Profile {
            a: KeySlot::default(),
            b: KeySlot::default(),
            x: KeySlot::default(),
            y: KeySlot::default(),
            lb: KeySlot::default(),
            rb: KeySlot::default(),
            back: KeySlot::default(),
            start: KeySlot::default(),
            ls_click: KeySlot::default(),
            rs_click: KeySlot::default(),
            dpad_up: KeySlot::default(),
            dpad_down: KeySlot::default(),
            dpad_left: KeySlot::default(),
            dpad_right: KeySlot::default(),
            left_stick_up: KeySlot::default(),
            left_stick_down: KeySlot::default(),
            left_stick_left: KeySlot::default(),
            left_stick_right: KeySlot::default(),
            right_stick_up: KeySlot::default(),
            right_stick_down: KeySlot::default(),
            right_stick_left: KeySlot::default(),
            right_stick_right: KeySlot::default(),
            lt: KeySlot::default(),
            rt: KeySlot::default(),
            exit_key_1: KeySlot::bound(PhysicalKey::Named("Escape".to_string())),
            exit_key_2: KeySlot::bound(PhysicalKey::Named("Backspace".to_string())),
            exit_hold_secs: 0.3,
            stick_magnitude: 1.0,
        }
    }
}

impl Profile {
    /// Read-only view of every binding slot with its document field name.
    pub fn slots(&self) -> [(&'static str, &KeySlot); 26] {
        [
            ("A", &self.a),
            ("B", &self.b),
            ("X", &self.x),
            ("Y", &self.y),
            ("LB", &self.lb),
            ("RB", &self.rb),
            ("BACK", &self.back),
            ("START", &self.start),
            ("LS_CLICK", &self.ls_click),
            ("RS_CLICK", &self.rs_click),
            ("DPAD_UP", &self.dpad_up),
            ("DPAD_DOWN", &self.dpad_down),
            ("DPAD_LEFT", &self.dpad_left),
            ("DPAD_RIGHT", &self.dpad_right),
            ("LEFT_STICK_UP", &self.left_stick_up),
            ("LEFT_STICK_DOWN", &self.left_stick_down),
            ("LEFT_STICK_LEFT", &self.left_stick_left),
            ("LEFT_STICK_RIGHT", &self.left_stick_right),
            ("RIGHT_STICK_UP", &self.right_stick_up),
            ("RIGHT_STICK_DOWN", &self.right_stick_down),
            ("RIGHT_STICK_LEFT", &self.right_stick_left),
            ("RIGHT_STICK_RIGHT", &self.right_stick_right),
            ("LT", &self.lt),
            ("RT", &self.rt),
            ("EXIT_KEY_1", &self.exit_key_1),
            ("EXIT_KEY_2", &self.exit_key_2),
        ]
    }

    /// Every binding slot paired with its document field name, in document
    /// order. Used by the lenient loader and the configuration surface.
    pub fn slots_mut(&mut self) -> [(&'static str, &mut KeySlot); 26] {
        [
            ("A", &mut self.a),
            ("B", &mut self.b),
            ("X", &mut self.x),
            ("Y", &mut self.y),
            ("LB", &mut self.lb),
            ("RB", &mut self.rb),
            ("BACK", &mut self.back),
            ("START", &mut self.start),
            ("LS_CLICK", &mut self.ls_click),
            ("RS_CLICK", &mut self.rs_click),
            ("DPAD_UP", &mut self.dpad_up),
            ("DPAD_DOWN", &mut self.dpad_down),
            ("DPAD_LEFT", &mut self.dpad_left),
            ("DPAD_RIGHT", &mut self.dpad_right),
            ("LEFT_STICK_UP", &mut self.left_stick_up),
            ("LEFT_STICK_DOWN", &mut self.left_stick_down),
            ("LEFT_STICK_LEFT", &mut self.left_stick_left),
            ("LEFT_STICK_RIGHT", &mut self.left_stick_right),
            ("RIGHT_STICK_UP", &mut self.right_stick_up),
            ("RIGHT_STICK_DOWN", &mut self.right_stick_down),
            ("RIGHT_STICK_LEFT", &mut self.right_stick_left),
            ("RIGHT_STICK_RIGHT", &mut self.right_stick_right),
            ("LT", &mut self.lt),
            ("RT", &mut self.rt),
            ("EXIT_KEY_1", &mut self.exit_key_1),
            ("EXIT_KEY_2", &mut self.exit_key_2),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_leave_all_controls_unmapped() {
        let mut profile = Profile::default();
        for (name, slot) in profile.slots_mut() {
            match name {
                "EXIT_KEY_1" | "EXIT_KEY_2" => assert!(!slot.is_unmapped()),
                _ => assert!(slot.is_unmapped(), "{name} should default to unmapped"),
            }
        }
        assert!((profile.exit_hold_secs - 0.3).abs() < f32::EPSILON);
        assert!((profile.stick_magnitude - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn slot_serializes_as_tagged_string() {
        let slot = KeySlot::bound(PhysicalKey::Char('j'));
        assert_eq!(serde_json::to_string(&slot).unwrap(), "\"CHAR:j\"");

        let empty = KeySlot::default();
        assert_eq!(serde_json::to_string(&empty).unwrap(), "\"\"");
    }

    #[test]
    fn slot_parses_empty_as_unmapped_and_rejects_junk() {
        let slot: KeySlot = serde_json::from_str("\"\"").unwrap();
        assert!(slot.is_unmapped());

        let slot: KeySlot = serde_json::from_str("\"VK:42\"").unwrap();
        assert_eq!(slot.key(), Some(&PhysicalKey::Code(42)));

        assert!(serde_json::from_str::<KeySlot>("\"garbage\"").is_err());
    }

    #[test]
    fn slot_labels_match_editor_expectations() {
        assert_eq!(KeySlot::default().label(), "(unmapped)");
        assert_eq!(
            KeySlot::bound(PhysicalKey::Named("Escape".to_string())).label(),
            "Key.Escape"
        );
        assert_eq!(KeySlot::bound(PhysicalKey::Code(113)).label(), "VK 113");
        assert_eq!(KeySlot::bound(PhysicalKey::Char('j')).label(), "'j'");
    }
}
