// Trend arrow mapping for the vendor's 0-5 trend codes
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Stable,
    Falling,
}

impl TrendDirection {
    pub fn label(self) -> &'static str {
        match self {
            TrendDirection::Rising => "Rising",
            TrendDirection::Stable => "Stable",
            TrendDirection::Falling => "Falling",
        }
    }
}

/// Trend arrow decoded from a vendor `TrendArrow` code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendArrow {
    pub code: i64,
    pub direction: TrendDirection,
    pub steep: bool,
}

impl TrendArrow {
    /// Unknown codes fall back to stable.
    pub fn from_code(code: i64) -> Self {
        let (direction, steep) = match code {
            5 => (TrendDirection::Rising, true),
            4 => (TrendDirection::Rising, false),
            2 => (TrendDirection::Falling, false),
            1 => (TrendDirection::Falling, true),
            _ => (TrendDirection::Stable, false),
        };

        Self {
            code,
            direction,
            steep,
        }
    }

    pub fn label(&self) -> &'static str {
        self.direction.label()
    }

    /// Codes 4 and 1 are drawn as the diagonal variants of the 5 and 2 arrows.
    pub fn glyph(&self) -> &'static str {
        match self.code {
            5 => "↑",
            4 => "↗",
            2 => "↓",
            1 => "↘",
            _ => "→",
        }
    }
}
