//! CSS colors for diagram styling.

use std::{fmt, str::FromStr};

use color::DynamicColor;

/// Wrapper around [`DynamicColor`] parsed from CSS color strings such as
/// `#ff0000`, `rgb(255, 0, 0)` or `red`.
#[derive(Clone, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Color {
    /// Parse a CSS color string.
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str) {
            Ok(color) => Ok(Color { color }),
            Err(err) => Err(format!("Invalid color '{color_str}': {err}")),
        }
    }

    /// Get an id-safe form of this color for use in SVG marker ids.
    pub fn to_id_safe_string(&self) -> String {
        let mut sanitized = self
            .to_string()
            .replace('#', "hex")
            .replace(['(', ')', ',', ' ', ';', '.', '%', '/'], "_");

        if sanitized.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            sanitized = format!("c_{sanitized}");
        }

        sanitized
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.color)
    }
}

impl From<&Color> for svg::node::Value {
    fn from(color: &Color) -> Self {
        svg::node::Value::from(color.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_and_hex() {
        assert!(Color::new("white").is_ok());
        assert!(Color::new("#336699").is_ok());
        assert!(Color::new("no-such-color").is_err());
    }

    #[test]
    fn test_id_safe_string() {
        let color = Color::new("rgb(10, 20, 30)").unwrap();
        let id = color.to_id_safe_string();

        assert!(
            id.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        );
    }
}
