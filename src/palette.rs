use serde::Serialize;

/// A hex color from the fixed palette or token set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Color(&'static str);

impl Color {
    /// `#rrggbb` components
    pub fn rgb(self) -> (u8, u8, u8) {
        let digits = self.0.trim_start_matches('#');
        let channel = |i: usize| {
            digits
                .get(i..i + 2)
                .and_then(|c| u8::from_str_radix(c, 16).ok())
                .unwrap_or(0)
        };
        (channel(0), channel(2), channel(4))
    }
}

pub const PRIMARY: Color = Color("#1f4e79");
pub const SUCCESS: Color = Color("#28a745");
pub const DANGER: Color = Color("#dc3545");
/// Highlight for the latest / current / provisional period
pub const EMPHASIS: Color = Color("#ff6b35");
pub const DARK: Color = Color("#343a40");
pub const LIGHT: Color = Color("#f8f9fa");

pub const PALETTE: [Color; 8] = [
    Color("#1f4e79"),
    Color("#2e8b57"),
    Color("#ff6b35"),
    Color("#28a745"),
    Color("#ffc107"),
    Color("#dc3545"),
    Color("#17a2b8"),
    Color("#6f42c1"),
];

/// Palette slot for a chart position, wrapping around
pub fn cyclic(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}
