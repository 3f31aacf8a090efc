/// RGBA colour, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 0xff {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Parse `rrggbb` or `rrggbbaa`, with or without a leading `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?).with_alpha(channel(6)?)),
            _ => None,
        }
    }
}

pub const WALL: Color = Color::rgb(0xef, 0x44, 0x44);
pub const DOOR: Color = Color::rgb(0x22, 0xc5, 0x5e);
pub const WINDOW: Color = Color::rgb(0x3b, 0x82, 0xf6);
pub const ROOM: Color = Color::rgb(0xa8, 0x55, 0xf7);
pub const DEFAULT: Color = Color::rgb(0xf5, 0x9e, 0x0b);
pub const LABEL_TEXT: Color = Color::rgb(0xff, 0xff, 0xff);

/// Known labels in legend order.
pub const LEGEND: [(&str, Color); 4] = [("wall", WALL), ("door", DOOR), ("window", WINDOW), ("room", ROOM)];

/// Colour for a detection label; unknown labels get the amber default.
pub fn color_for_label(label: &str) -> Color {
    match label.to_lowercase().as_str() {
        "wall" => WALL,
        "door" => DOOR,
        "window" => WINDOW,
        "room" => ROOM,
        _ => DEFAULT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_for_label() {
        assert_eq!(color_for_label("wall"), WALL);
        assert_eq!(color_for_label("DOOR"), DOOR);
        assert_eq!(color_for_label("Window"), WINDOW);
        assert_eq!(color_for_label("room"), ROOM);
        assert_eq!(color_for_label("stairs"), DEFAULT);
        assert_eq!(color_for_label(""), DEFAULT);
    }

    #[test]
    fn test_hex_roundtrip() {
        assert_eq!(WALL.to_hex(), "#ef4444");
        assert_eq!(DOOR.with_alpha(0x20).to_hex(), "#22c55e20");
        assert_eq!(Color::from_hex("#a855f7"), Some(ROOM));
        assert_eq!(Color::from_hex("22c55e20"), Some(DOOR.with_alpha(0x20)));
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("zzzzzz"), None);
    }
}
