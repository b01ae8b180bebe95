//! Player settings data model.
//!
//! Settings travel inside the persisted profile. Every field has a default so
//! documents written by older clients load cleanly.

use serde::{Deserialize, Serialize};

/// Default mentor personality descriptor.
pub const DEFAULT_PERSONALITY: &str =
    "Brilliant, supportive, and slightly eccentric academic mentor.";

/// Personality presets offered by the settings screen (label, descriptor).
pub const PERSONALITY_PRESETS: [(&str, &str); 3] = [
    (
        "Friendly Mentor",
        "Brilliant, supportive, and warm personal guide.",
    ),
    (
        "Academic Coach",
        "Focused, disciplined, and results-oriented coach.",
    ),
    (
        "Creative Peer",
        "Creative, inspiring, and approachable study partner.",
    ),
];

/// Accent color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeColor {
    /// Classic violet.
    #[default]
    Violet,
    /// Green.
    Emerald,
    /// Blue.
    Blue,
    /// Rose.
    Rose,
    /// Honey.
    Amber,
}

impl ThemeColor {
    /// Primary hex color.
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Violet => "#8b5cf6",
            Self::Emerald => "#10b981",
            Self::Blue => "#3b82f6",
            Self::Rose => "#f43f5e",
            Self::Amber => "#f59e0b",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Violet => "Classic",
            Self::Emerald => "Green",
            Self::Blue => "Blue",
            Self::Rose => "Rose",
            Self::Amber => "Honey",
        }
    }
}

/// Which mentor model tier the player prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelPreference {
    /// Low-latency model.
    #[default]
    Fast,
    /// Stronger, slower model.
    Genius,
}

/// Player settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Accent color.
    pub color: ThemeColor,
    /// High contrast background.
    pub is_high_contrast: bool,
    /// Whether notifications are shown.
    pub notifications_enabled: bool,
    /// Mentor personality descriptor.
    pub rudhh_personality: String,
    /// Mentor model preference.
    pub model_preference: ModelPreference,
    /// Whether rank XP and rank transitions are tracked.
    pub is_ranked_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: ThemeColor::Violet,
            is_high_contrast: false,
            notifications_enabled: true,
            rudhh_personality: DEFAULT_PERSONALITY.to_string(),
            model_preference: ModelPreference::Fast,
            is_ranked_mode: true,
        }
    }
}

impl Settings {
    /// Background color for the current contrast mode.
    #[must_use]
    pub const fn background(&self) -> &'static str {
        if self.is_high_contrast {
            "#000000"
        } else {
            "#0f172a"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.is_ranked_mode);
        assert!(settings.notifications_enabled);
        assert_eq!(settings.color, ThemeColor::Violet);
        assert_eq!(settings.model_preference, ModelPreference::Fast);
        assert_eq!(settings.rudhh_personality, DEFAULT_PERSONALITY);
    }

    #[test]
    fn test_missing_ranked_mode_defaults_to_on() {
        let json = r#"{"color":"rose","isHighContrast":true,"notificationsEnabled":false,
            "rudhhPersonality":"terse","modelPreference":"genius"}"#;
        let settings: Settings = serde_json::from_str(json).expect("parse");

        assert!(settings.is_ranked_mode);
        assert_eq!(settings.color, ThemeColor::Rose);
        assert_eq!(settings.model_preference, ModelPreference::Genius);
        assert_eq!(settings.background(), "#000000");
    }
}
