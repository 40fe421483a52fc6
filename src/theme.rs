use ratatui::style::Color;

// Color palette structure
#[derive(Clone, Debug)]
pub struct Base16Palette {
    pub base_00: Color, // Background
    pub base_01: Color, // Lighter background
    pub base_02: Color, // Selection background
    pub base_03: Color, // Comments, invisibles
    pub base_04: Color, // Dark foreground
    pub base_05: Color, // Default foreground
    pub base_06: Color, // Light foreground
    pub base_07: Color, // Light background
    pub base_08: Color, // Red
    pub base_0a: Color, // Yellow
    pub base_0c: Color, // Cyan
    pub base_0d: Color, // Blue
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

// Oceanic Next theme
pub static OCEANIC_NEXT: Base16Palette = Base16Palette {
    base_00: rgb(0x1B2B34),
    base_01: rgb(0x343D46),
    base_02: rgb(0x4F5B66),
    base_03: rgb(0x65737E),
    base_04: rgb(0xA7ADBA),
    base_05: rgb(0xC0C5CE),
    base_06: rgb(0xCDD3DE),
    base_07: rgb(0xF0F4F8),
    base_08: rgb(0xEC5F67),
    base_0a: rgb(0xFAC863),
    base_0c: rgb(0x5FB3B3),
    base_0d: rgb(0x6699CC),
};

// Catppuccin Mocha theme
pub static CATPPUCCIN_MOCHA: Base16Palette = Base16Palette {
    base_00: rgb(0x1E1E2E),
    base_01: rgb(0x313244),
    base_02: rgb(0x45475A),
    base_03: rgb(0x6C7086),
    base_04: rgb(0x7F849C),
    base_05: rgb(0xA6ADC8),
    base_06: rgb(0xCDD6F4),
    base_07: rgb(0xF5E0DC),
    base_08: rgb(0xF38BA8),
    base_0a: rgb(0xF9E2AF),
    base_0c: rgb(0x94E2D5),
    base_0d: rgb(0x89B4FA),
};

/// Look up a palette by its settings name; unknown names fall back to the
/// default theme.
#[must_use]
pub fn palette_by_name(name: &str) -> &'static Base16Palette {
    match name {
        "Catppuccin Mocha" => &CATPPUCCIN_MOCHA,
        _ => &OCEANIC_NEXT,
    }
}

impl Base16Palette {
    /// Background as raw RGB for the pixel surface behind rendered pages.
    #[must_use]
    pub fn bg_rgb(&self) -> (u8, u8, u8) {
        match self.base_00 {
            Color::Rgb(r, g, b) => (r, g, b),
            _ => (0, 0, 0),
        }
    }
}
