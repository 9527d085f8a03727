//! Per-series presentation: line colors and point markers.
//!
//! Both are parsed from the short textual forms accepted on the command line and
//! converted to whatever the rendering backends need.

use crate::error::AppError;
use std::fmt;
use std::str::FromStr;

/// The default color cycle, applied by series index when no color is given.
const DEFAULT_CYCLE: [Rgb; 10] = [
    Rgb(0x1f, 0x77, 0xb4),
    Rgb(0xff, 0x7f, 0x0e),
    Rgb(0x2c, 0xa0, 0x2c),
    Rgb(0xd6, 0x27, 0x28),
    Rgb(0x94, 0x67, 0xbd),
    Rgb(0x8c, 0x56, 0x4b),
    Rgb(0xe3, 0x77, 0xc2),
    Rgb(0x7f, 0x7f, 0x7f),
    Rgb(0xbc, 0xbd, 0x22),
    Rgb(0x17, 0xbe, 0xcf),
];

/// An opaque 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Color of the `index`-th series when none was requested.
    pub fn cycle(index: usize) -> Self {
        DEFAULT_CYCLE[index % DEFAULT_CYCLE.len()]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl FromStr for Rgb {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();

        if let Some(hex) = name.strip_prefix('#') {
            // `#rgb` is shorthand for `#rrggbb`.
            let expanded: String;
            let hex = if hex.len() == 3 {
                expanded = hex.chars().flat_map(|c| [c, c]).collect();
                expanded.as_str()
            } else {
                hex
            };
            if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
                if let (Ok(r), Ok(g), Ok(b)) = (channel(0), channel(2), channel(4)) {
                    return Ok(Rgb(r, g, b));
                }
            }
            return Err(AppError::InvalidColor(s.to_string()));
        }

        // `C0`..`C9` pick from the default cycle.
        if let Some(n) = name.strip_prefix('c').and_then(|d| d.parse::<usize>().ok()) {
            return Ok(Rgb::cycle(n));
        }

        let rgb = match name.as_str() {
            "b" | "blue" => Rgb(0, 0, 255),
            "g" | "green" => Rgb(0, 128, 0),
            "r" | "red" => Rgb(255, 0, 0),
            "c" | "cyan" => Rgb(0, 191, 191),
            "m" | "magenta" => Rgb(191, 0, 191),
            "y" | "yellow" => Rgb(191, 191, 0),
            "k" | "black" => Rgb(0, 0, 0),
            "w" | "white" => Rgb(255, 255, 255),
            "orange" => Rgb(255, 165, 0),
            "purple" => Rgb(128, 0, 128),
            "brown" => Rgb(165, 42, 42),
            "pink" => Rgb(255, 192, 203),
            "gray" | "grey" => Rgb(128, 128, 128),
            "olive" => Rgb(128, 128, 0),
            "navy" => Rgb(0, 0, 128),
            _ => return Err(AppError::InvalidColor(s.to_string())),
        };
        Ok(rgb)
    }
}

/// Shape drawn at every visible data point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    Point,
    Circle,
    Square,
    Triangle,
    Cross,
    Plus,
    Diamond,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Marker::Point => ".",
            Marker::Circle => "o",
            Marker::Square => "s",
            Marker::Triangle => "^",
            Marker::Cross => "x",
            Marker::Plus => "+",
            Marker::Diamond => "D",
        };
        f.write_str(symbol)
    }
}

impl FromStr for Marker {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "." | "point" => Ok(Marker::Point),
            "o" | "circle" => Ok(Marker::Circle),
            "s" | "square" => Ok(Marker::Square),
            "^" | "triangle" => Ok(Marker::Triangle),
            "x" | "cross" => Ok(Marker::Cross),
            "+" | "plus" => Ok(Marker::Plus),
            "D" | "d" | "diamond" => Ok(Marker::Diamond),
            _ => Err(AppError::InvalidMarker(s.to_string())),
        }
    }
}

/// Presentation attributes of one series. Unset fields fall back to defaults
/// at render time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeriesStyle {
    pub label: Option<String>,
    pub color: Option<Rgb>,
    pub marker: Option<Marker>,
}

impl SeriesStyle {
    /// The color actually drawn for the series at `index`.
    pub fn resolved_color(&self, index: usize) -> Rgb {
        self.color.unwrap_or_else(|| Rgb::cycle(index))
    }
}

/// Builds one style per series, matching the given lists to series positionally.
/// Missing entries leave the attribute unset; surplus entries are ignored.
pub fn series_styles(
    count: usize,
    labels: Option<&[String]>,
    colors: Option<&[String]>,
    markers: Option<&[String]>,
) -> Result<Vec<SeriesStyle>, AppError> {
    (0..count)
        .map(|i| {
            let label = labels.and_then(|l| l.get(i)).cloned();
            let color = colors
                .and_then(|c| c.get(i))
                .map(|c| c.parse::<Rgb>())
                .transpose()?;
            let marker = markers
                .and_then(|m| m.get(i))
                .map(|m| m.parse::<Marker>())
                .transpose()?;
            Ok(SeriesStyle {
                label,
                color,
                marker,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colors() {
        assert_eq!("#1F77b4".parse::<Rgb>().unwrap(), Rgb(0x1f, 0x77, 0xb4));
        assert_eq!("red".parse::<Rgb>().unwrap(), Rgb(255, 0, 0));
        assert_eq!("k".parse::<Rgb>().unwrap(), Rgb(0, 0, 0));
        assert_eq!("C1".parse::<Rgb>().unwrap(), Rgb::cycle(1));
        assert_eq!("#f80".parse::<Rgb>().unwrap(), Rgb(0xff, 0x88, 0x00));
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("chartreuse-ish".parse::<Rgb>().is_err());
    }

    #[test]
    fn color_displays_as_hex() {
        assert_eq!(Rgb(0x1f, 0x77, 0xb4).to_string(), "#1f77b4");
    }

    #[test]
    fn parses_markers() {
        assert_eq!("o".parse::<Marker>().unwrap(), Marker::Circle);
        assert_eq!("^".parse::<Marker>().unwrap(), Marker::Triangle);
        assert!("?".parse::<Marker>().is_err());
    }

    #[test]
    fn styles_match_positionally_and_leave_gaps_unset() {
        let labels = vec!["first".to_string()];
        let colors = vec!["red".to_string(), "blue".to_string(), "green".to_string()];
        let styles = series_styles(2, Some(labels.as_slice()), Some(colors.as_slice()), None).unwrap();

        assert_eq!(styles.len(), 2);
        assert_eq!(styles[0].label.as_deref(), Some("first"));
        assert_eq!(styles[1].label, None);
        assert_eq!(styles[1].color, Some(Rgb(0, 0, 255)));
        assert_eq!(styles[0].marker, None);
        assert_eq!(styles[1].resolved_color(1), Rgb(0, 0, 255));
        assert_eq!(SeriesStyle::default().resolved_color(3), Rgb::cycle(3));
    }

    #[test]
    fn invalid_style_entry_is_an_error() {
        let markers = vec!["o".to_string(), "nope".to_string()];
        assert!(series_styles(2, None, None, Some(markers.as_slice())).is_err());
    }
}
