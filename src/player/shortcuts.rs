#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shortcut {
    TogglePlay,
    SeekBackward,
    SeekForward,
    VolumeUp,
    VolumeDown,
    ToggleMute,
    ToggleFullscreen,
}

impl Shortcut {
    /// Map a physical key code (`Space`, `ArrowLeft`, `KeyM`, ...) to a shortcut.
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "Space" => Self::TogglePlay,
            "ArrowLeft" => Self::SeekBackward,
            "ArrowRight" => Self::SeekForward,
            "ArrowUp" => Self::VolumeUp,
            "ArrowDown" => Self::VolumeDown,
            "KeyM" => Self::ToggleMute,
            "KeyF" => Self::ToggleFullscreen,
            _ => return None,
        })
    }
}

/// Where keyboard focus sits when a key is pressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusContext {
    /// The key went to a text input, text area or editable element
    pub in_text_input: bool,
    /// The focused element lives inside the player surface
    pub within_surface: bool,
    /// A slider of the player is being dragged
    pub interacting_with_controls: bool,
}

impl FocusContext {
    pub fn allows_shortcuts(&self) -> bool {
        !self.in_text_input || self.within_surface || self.interacting_with_controls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_key_codes() {
        assert_eq!(Shortcut::from_code("Space"), Some(Shortcut::TogglePlay));
        assert_eq!(
            Shortcut::from_code("KeyF"),
            Some(Shortcut::ToggleFullscreen)
        );
        assert_eq!(Shortcut::from_code("KeyX"), None);
    }

    #[test]
    fn text_inputs_outside_the_surface_swallow_keys() {
        assert!(FocusContext::default().allows_shortcuts());
        let typing = FocusContext {
            in_text_input: true,
            ..Default::default()
        };
        assert!(!typing.allows_shortcuts());
        assert!(
            FocusContext {
                within_surface: true,
                ..typing
            }
            .allows_shortcuts()
        );
    }
}
