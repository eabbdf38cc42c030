//! Calendar color palette.
//!
//! # Responsibility
//! - Translate stored canonical color names into presentation hex values.
//! - Alias legacy hex values written by older clients onto the current palette.
//! - Provide the reverse mapping used when presentation writes a color back.
//!
//! # Invariants
//! - Unknown values pass through unchanged in both directions.
//! - Completed occurrences always use the fixed `done` palette entry.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Background for completed occurrences.
pub const DONE_BACKGROUND: &str = "#b2ffb2";
/// Border for completed occurrences.
pub const DONE_BORDER: &str = "#4caf50";
/// Text color for completed occurrences.
pub const DONE_TEXT: &str = "#222";
/// Text color for open occurrences.
pub const OPEN_TEXT: &str = "#ffffff";

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}){1,2}$").expect("valid hex color regex"));

/// Closed palette offered to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaletteColor {
    Blue,
    Red,
    Green,
    Yellow,
}

/// Legacy and current hex values, lower-cased.
const HEX_ALIASES: &[(&str, PaletteColor)] = &[
    ("#3b82f6", PaletteColor::Blue),
    ("#6fa8dc", PaletteColor::Blue),
    ("#3788d8", PaletteColor::Blue),
    ("#ef4444", PaletteColor::Red),
    ("#e06666", PaletteColor::Red),
    ("#ffb2b2", PaletteColor::Red),
    ("#b2ffb2", PaletteColor::Green),
    ("#eab308", PaletteColor::Yellow),
    ("#ffd966", PaletteColor::Yellow),
    ("#ffd700", PaletteColor::Yellow),
    ("#f59e0b", PaletteColor::Yellow),
    ("#ffe9b2", PaletteColor::Yellow),
];

impl PaletteColor {
    /// Palette entry used when a task carries no color.
    pub const DEFAULT: Self = Self::Blue;

    /// Canonical name persisted by the task store.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Blue => "blau",
            Self::Red => "rot",
            Self::Green => "grün",
            Self::Yellow => "gelb",
        }
    }

    /// Current presentation hex value.
    pub fn hex(self) -> &'static str {
        match self {
            Self::Blue => "#3b82f6",
            Self::Red => "#ef4444",
            Self::Green => "#b2ffb2",
            Self::Yellow => "#eab308",
        }
    }

    /// Looks up a canonical name, case-insensitively.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "blau" => Some(Self::Blue),
            "rot" => Some(Self::Red),
            // Second spelling: UTF-8 bytes decoded as Latin-1 by an old backend.
            "grün" | "grã¼n" => Some(Self::Green),
            "gelb" => Some(Self::Yellow),
            _ => None,
        }
    }

    /// Looks up a current or legacy hex value.
    pub fn from_hex(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if !HEX_COLOR_RE.is_match(trimmed) {
            return None;
        }
        let normalized = trimmed.to_ascii_lowercase();
        HEX_ALIASES
            .iter()
            .find(|(hex, _)| *hex == normalized)
            .map(|(_, color)| *color)
    }

    /// Resolves either a canonical name or a known hex value.
    pub fn resolve(value: &str) -> Option<Self> {
        Self::from_wire_name(value).or_else(|| Self::from_hex(value))
    }
}

/// Maps a stored color value to its presentation hex.
///
/// Missing values use the default palette entry; unknown values pass through.
pub fn color_hex(value: Option<&str>) -> String {
    match value {
        None => PaletteColor::DEFAULT.hex().to_string(),
        Some(raw) if raw.trim().is_empty() => PaletteColor::DEFAULT.hex().to_string(),
        Some(raw) => PaletteColor::resolve(raw)
            .map(|color| color.hex().to_string())
            .unwrap_or_else(|| raw.to_string()),
    }
}

/// Maps a presentation value back to the canonical stored name.
pub fn color_wire_name(value: &str) -> String {
    PaletteColor::resolve(value)
        .map(|color| color.wire_name().to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Resolved presentation colors for one occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccurrenceColors {
    pub background: String,
    pub border: String,
    pub text: String,
}

impl OccurrenceColors {
    pub fn for_task(color: Option<&str>, done: bool) -> Self {
        if done {
            return Self {
                background: DONE_BACKGROUND.to_string(),
                border: DONE_BORDER.to_string(),
                text: DONE_TEXT.to_string(),
            };
        }
        let hex = color_hex(color);
        Self {
            background: hex.clone(),
            border: hex,
            text: OPEN_TEXT.to_string(),
        }
    }
}
