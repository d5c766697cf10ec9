//! Colours used on uploaded canvases
//!
//! The destination service takes colours as `{r, g, b, a}` objects with an
//! alpha in `0..=1`. Users pick border colours as `#rrggbb` hex strings.

use serde::Serialize;

/// An RGBA colour as understood by the destination workspace
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse a `#rrggbb` colour, returning None for anything else
    pub fn from_hex(hex: &str) -> Option<Self> {
        if !is_hex_color(hex) {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self::opaque(channel(1..3)?, channel(3..5)?, channel(5..7)?))
    }
}

pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);
pub const TRANSPARENT: Rgba = Rgba {
    r: 255,
    g: 255,
    b: 255,
    a: 0.0,
};
pub const CHARCOAL_50: Rgba = Rgba::opaque(145, 149, 151);
pub const CHARCOAL_90: Rgba = Rgba::opaque(67, 74, 80);
pub const CHARCOAL_100: Rgba = Rgba::opaque(46, 54, 61);
pub const LIGHT_BLUE: Rgba = Rgba::opaque(204, 226, 255);
pub const SOFT_YELLOW: Rgba = Rgba::opaque(254, 240, 159);

/// Check for a `#rrggbb` hex colour
pub fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Border colours offered to users picking a canvas border
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestedBorderColor {
    Blue,
    Teal,
    Yellow,
    Orange,
    Red,
    Magenta,
    Purple,
}

impl SuggestedBorderColor {
    pub const ALL: [SuggestedBorderColor; 7] = [
        Self::Blue,
        Self::Teal,
        Self::Yellow,
        Self::Orange,
        Self::Red,
        Self::Magenta,
        Self::Purple,
    ];

    pub fn hex(&self) -> &'static str {
        match self {
            Self::Blue => "#0000ff",
            Self::Teal => "#008080",
            Self::Yellow => "#ffff00",
            Self::Orange => "#ffa500",
            Self::Red => "#ff0000",
            Self::Magenta => "#ff00ff",
            Self::Purple => "#800080",
        }
    }

    /// All suggestions as a comma separated list of hex codes
    pub fn hex_list() -> String {
        Self::ALL.map(|c| c.hex()).join(", ")
    }
}
