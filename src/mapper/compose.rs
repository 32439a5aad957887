//! Pure frame computation: held keys + profile in, controller frame out.

use crate::input::KeySnapshot;
use crate::pad::{ButtonSet, ControllerFrame, PadButton, StickVector, STICK_MAX, TRIGGER_MAX};
use crate::profile::{KeySlot, Profile};

/// Computes the pad state for one cycle. No I/O, no clock, no mutation:
/// the same snapshot and profile always produce the same frame.
pub fn compose_frame(keys: &KeySnapshot, profile: &Profile) -> ControllerFrame {
    let mut buttons = ButtonSet::default();
    buttons.set(PadButton::A, keys.is_down(profile.a.key()));
    buttons.set(PadButton::B, keys.is_down(profile.b.key()));
    buttons.set(PadButton::X, keys.is_down(profile.x.key()));
    buttons.set(PadButton::Y, keys.is_down(profile.y.key()));
    buttons.set(PadButton::LeftShoulder, keys.is_down(profile.lb.key()));
    buttons.set(PadButton::RightShoulder, keys.is_down(profile.rb.key()));
    buttons.set(PadButton::Back, keys.is_down(profile.back.key()));
    buttons.set(PadButton::Start, keys.is_down(profile.start.key()));
    buttons.set(PadButton::LeftThumb, keys.is_down(profile.ls_click.key()));
    buttons.set(PadButton::RightThumb, keys.is_down(profile.rs_click.key()));
    buttons.set(PadButton::DpadUp, keys.is_down(profile.dpad_up.key()));
    buttons.set(PadButton::DpadDown, keys.is_down(profile.dpad_down.key()));
    buttons.set(PadButton::DpadLeft, keys.is_down(profile.dpad_left.key()));
    buttons.set(PadButton::DpadRight, keys.is_down(profile.dpad_right.key()));

    let magnitude = profile.stick_magnitude.clamp(0.0, 1.0);
    let left_stick = stick_vector(
        axis_input(keys, &profile.left_stick_right, &profile.left_stick_left),
        axis_input(keys, &profile.left_stick_up, &profile.left_stick_down),
        magnitude,
    );
    let right_stick = stick_vector(
        axis_input(keys, &profile.right_stick_right, &profile.right_stick_left),
        axis_input(keys, &profile.right_stick_up, &profile.right_stick_down),
        magnitude,
    );

    ControllerFrame {
        buttons,
        left_stick,
        right_stick,
        left_trigger: trigger_level(keys.is_down(profile.lt.key())),
        right_trigger: trigger_level(keys.is_down(profile.rt.key())),
    }
}

/// Raw axis contribution in {-1, 0, 1}. Opposite keys held together cancel.
fn axis_input(keys: &KeySnapshot, positive: &KeySlot, negative: &KeySlot) -> i32 {
    keys.is_down(positive.key()) as i32 - keys.is_down(negative.key()) as i32
}

fn stick_vector(x: i32, y: i32, magnitude: f32) -> StickVector {
    StickVector {
        x: axis_value(x as f32 * magnitude),
        y: axis_value(y as f32 * magnitude),
    }
}

/// Maps a scaled deflection in [-1, 1] to the device's signed axis range.
/// Rounds rather than truncates so full deflection reaches exactly the
/// positive maximum.
pub fn axis_value(v: f32) -> i16 {
    (v.clamp(-1.0, 1.0) * f32::from(STICK_MAX)).round() as i16
}

/// Triggers are digital-to-analog: fully engaged while held, otherwise rest.
fn trigger_level(held: bool) -> u8 {
    if held {
        TRIGGER_MAX
    } else {
        0
    }
}
