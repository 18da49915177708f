//! # Joystick Equipment Messages

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Topic prefix of joystick messages.
pub const JOY_TOPIC: &str = "joy";

/// Number of buttons read from the joystick.
pub const NUM_JOY_BUTTONS: usize = 8;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The state of the joystick buttons. Zero is released, anything else is pressed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoyButtons {
    pub buttons: [i32; NUM_JOY_BUTTONS],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JoyButtons {
    /// Build the button state from a raw button list, as sent by most joystick drivers.
    ///
    /// Extra buttons are ignored, missing buttons are released.
    pub fn from_raw(raw: &[i32]) -> Self {
        let mut buttons = [0; NUM_JOY_BUTTONS];
        for (b, r) in buttons.iter_mut().zip(raw.iter()) {
            *b = *r;
        }
        Self { buttons }
    }

    /// Returns true if any button is pressed.
    pub fn any_pressed(&self) -> bool {
        self.buttons.iter().any(|b| *b != 0)
    }

    /// Returns true if the button at `idx` is pressed. Out of range indices are never pressed.
    pub fn is_pressed(&self, idx: usize) -> bool {
        self.buttons.get(idx).map(|b| *b != 0).unwrap_or(false)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_joy_buttons() {
        let none = JoyButtons::default();
        assert!(!none.any_pressed());

        let joy = JoyButtons::from_raw(&[0, 0, 1, 0, 0, 0, 0, 0, 1, 1]);
        assert!(joy.any_pressed());
        assert!(joy.is_pressed(2));
        assert!(!joy.is_pressed(5));
        assert!(!joy.is_pressed(NUM_JOY_BUTTONS));

        let short = JoyButtons::from_raw(&[0, 0, 0, 0, 0, 1]);
        assert!(short.is_pressed(5));
        assert_eq!(short.buttons[7], 0);
    }

    #[test]
    fn test_joy_json() {
        let joy: JoyButtons =
            serde_json::from_str(r#"{"buttons":[0,1,0,0,0,0,0,0]}"#).unwrap();
        assert!(joy.is_pressed(1));
    }
}
