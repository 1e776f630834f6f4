//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Gem colours, board chrome and text colours.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Gem colours by kind (kind 1 is index 0); wraps for larger alphabets.
    pub gems: [Color; 7],
    pub bomb: Color,
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, level).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Cursor frame and selected-gem background.
    pub cursor: Color,
    pub selected_bg: Color,
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

const ONEDARK_GEMS: [Color; 7] = [
    rgb(0x98C379), // green
    rgb(0xE5C07B), // yellow
    rgb(0xE06C75), // red
    rgb(0x61AFEF), // blue
    rgb(0xC678DD), // magenta
    rgb(0x56B6C2), // cyan
    rgb(0xD19A66), // orange
];

const HIGH_CONTRAST_GEMS: [Color; 7] = [
    rgb(0x00FF00),
    rgb(0xFFFF00),
    rgb(0xFF0000),
    rgb(0x0088FF),
    rgb(0xFF00FF),
    rgb(0x00FFFF),
    rgb(0xFF8800),
];

/// Tol's bright scheme plus grey; distinguishable without red/green.
const COLORBLIND_GEMS: [Color; 7] = [
    rgb(0x0077BB),
    rgb(0xEE7733),
    rgb(0x009988),
    rgb(0xCC3311),
    rgb(0xEE3377),
    rgb(0xBBBB00),
    rgb(0xBBBBBB),
];

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// One Dark defaults, hex values from onedark.theme.
    pub fn onedark_default() -> Self {
        Self {
            gems: ONEDARK_GEMS,
            bomb: rgb(0xFFFFFF),
            bg: rgb(0x31353F),
            div_line: rgb(0x3F444F),
            main_fg: rgb(0xABB2BF),
            title: rgb(0xE5C07B),
            cursor: rgb(0xFFFFFF),
            selected_bg: rgb(0x5C6370),
            inactive_fg: rgb(0x5C6370),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            _ => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override gem colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => self.gems = HIGH_CONTRAST_GEMS,
            crate::Palette::Colorblind => self.gems = COLORBLIND_GEMS,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let d = Self::onedark_default();
        Self {
            gems: [
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(d.gems[0]),
                get("title").or_else(|| get("cpu_mid")).unwrap_or(d.gems[1]),
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(d.gems[2]),
                get("cpu_box").unwrap_or(d.gems[3]),
                get("net_box").unwrap_or(d.gems[4]),
                get("hi_fg").or_else(|| get("proc_misc")).unwrap_or(d.gems[5]),
                get("temp_mid").unwrap_or(d.gems[6]),
            ],
            bomb: get("selected_fg").unwrap_or(d.bomb),
            bg: get("meter_bg").unwrap_or(d.bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            cursor: get("hi_fg").unwrap_or(d.cursor),
            selected_bg: get("selected_bg").unwrap_or(d.selected_bg),
            inactive_fg: get("inactive_fg").unwrap_or(d.inactive_fg),
        }
    }

    /// Colour for gem kind `1..=K`.
    #[inline]
    pub fn gem_color(&self, kind: u8) -> Color {
        self.gems[usize::from(kind.saturating_sub(1)) % self.gems.len()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |digits: &str, scale: u8| {
        u8::from_str_radix(digits, 16)
            .map(|v| v * scale)
            .map_err(|_| invalid())
    };
    let (r, g, b) = match s.len() {
        6 => (channel(&s[0..2], 1)?, channel(&s[2..4], 1)?, channel(&s[4..6], 1)?),
        3 => (channel(&s[0..1], 17)?, channel(&s[1..2], 17)?, channel(&s[2..3], 17)?),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}
