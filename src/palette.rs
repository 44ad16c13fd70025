use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaletteColor {
    pub name: &'static str,
    pub hex: &'static str,
    pub points: i64,
}

/// Display order matches the button row in the UI.
pub const PALETTE: [PaletteColor; 7] = [
    PaletteColor {
        name: "Pink",
        hex: "#FF69B4",
        points: 1,
    },
    PaletteColor {
        name: "Purple",
        hex: "#8A2BE2",
        points: 1,
    },
    PaletteColor {
        name: "Blue",
        hex: "#1E90FF",
        points: 1,
    },
    PaletteColor {
        name: "Green",
        hex: "#2E8B57",
        points: 0,
    },
    PaletteColor {
        name: "Yellow",
        hex: "#FFD700",
        points: -1,
    },
    PaletteColor {
        name: "Orange",
        hex: "#FF8C00",
        points: -1,
    },
    PaletteColor {
        name: "Red",
        hex: "#DC143C",
        points: -1,
    },
];

pub fn lookup(color: &str) -> Option<&'static PaletteColor> {
    let t = color.trim();
    PALETTE.iter().find(|c| c.name.eq_ignore_ascii_case(t))
}

/// Point value for a stored color. Colors outside the palette score 0.
pub fn points_for(color: &str) -> i64 {
    lookup(color).map(|c| c.points).unwrap_or(0)
}

pub fn display_index(color: &str) -> Option<usize> {
    let t = color.trim();
    PALETTE.iter().position(|c| c.name.eq_ignore_ascii_case(t))
}
