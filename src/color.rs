//! Parsing of hexadecimal color specifications and override/default resolution.


use std::fmt;
use std::str::FromStr;


/// An error pertaining to a color specification.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Error {
    /// The color string is not six hexadecimal digits with an optional leading `#`.
    InvalidColorFormat { value: String },
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidColorFormat { value }
                => write!(f, "invalid color format {:?} (expected six hex digits, optionally preceded by '#')", value),
        }
    }
}
impl std::error::Error for Error {
}


/// A resolved RGB color with 8 bits per channel.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ColorValue {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}
impl ColorValue {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// The channels scaled to the `0.0..=1.0` range used by DeviceRGB operators.
    pub fn to_unit_components(&self) -> [f32; 3] {
        [
            f32::from(self.red) / 255.0,
            f32::from(self.green) / 255.0,
            f32::from(self.blue) / 255.0,
        ]
    }
}
impl FromStr for ColorValue {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);

        // checking the digits up front also rules out the sign that from_str_radix would accept
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidColorFormat { value: s.to_owned() });
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| Error::InvalidColorFormat { value: s.to_owned() })
        };
        Ok(Self {
            red: channel(0..2)?,
            green: channel(2..4)?,
            blue: channel(4..6)?,
        })
    }
}


/// Picks the effective color for one styling attribute of a field.
///
/// A present, non-empty override is always the one parsed; if it is malformed, the error is
/// returned and the default is *not* consulted. Only an absent (or empty) override falls back to
/// the default. With neither available, the attribute stays unstyled (`Ok(None)`).
pub fn resolve(override_color: Option<&str>, default_color: Option<&str>) -> Result<Option<ColorValue>, Error> {
    let chosen = match override_color {
        Some(oc) if !oc.is_empty() => oc,
        _ => match default_color {
            Some(dc) if !dc.is_empty() => dc,
            _ => return Ok(None),
        },
    };
    chosen.parse().map(Some)
}
