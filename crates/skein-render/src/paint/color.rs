use std::str::FromStr;

/// Straight-alpha sRGB color, one byte per channel.
///
/// This is the host-facing color representation for nodes and edges. The
/// renderers never interpolate it on the CPU; it travels to the GPU packed
/// into a single vertex attribute lane (see [`Color::pack`]).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Packs the channels into one `u32`, little-endian byte order
    /// `[r, g, b, a]`.
    ///
    /// Invariant: this must stay bit-exact with the `unorm8x4` color
    /// attribute the shaders declare over the same bytes — the shader reads
    /// the lane's four bytes as normalized r, g, b, a in that order. Any
    /// change here silently corrupts every entity color.
    #[inline]
    pub const fn pack(self) -> u32 {
        (self.r as u32) | (self.g as u32) << 8 | (self.b as u32) << 16 | (self.a as u32) << 24
    }

    /// Returns the packed color reinterpreted as the bits of an `f32`, so it
    /// can occupy one lane of an interleaved float vertex stream.
    ///
    /// The value is only ever memcpy'd into the stream and uploaded; it is
    /// never used arithmetically (many packed colors are NaN bit patterns).
    #[inline]
    pub const fn to_attribute(self) -> f32 {
        f32::from_bits(self.pack())
    }
}

/// Color parse failure; carries the rejected input.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParseColorError(pub String);

impl std::fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognized color: {:?}", self.0)
    }
}

impl std::error::Error for ParseColorError {}

impl FromStr for Color {
    type Err = ParseColorError;

    /// Accepts `#rgb`, `#rrggbb`, `rgb(r,g,b)` and `rgba(r,g,b,a)` with
    /// byte channels and a `0.0..=1.0` float alpha.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ParseColorError(s.to_owned()));
        }

        if let Some(body) = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))
            .and_then(|b| b.strip_suffix(')'))
        {
            return parse_channels(body).ok_or_else(|| ParseColorError(s.to_owned()));
        }

        Err(ParseColorError(s.to_owned()))
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let nib = |c: u8| (c as char).to_digit(16).map(|d| d as u8);

    match hex.as_bytes() {
        [r, g, b] => {
            let (r, g, b) = (nib(*r)?, nib(*g)?, nib(*b)?);
            Some(Color::rgb(r * 17, g * 17, b * 17))
        }
        [r1, r0, g1, g0, b1, b0] => Some(Color::rgb(
            nib(*r1)? * 16 + nib(*r0)?,
            nib(*g1)? * 16 + nib(*g0)?,
            nib(*b1)? * 16 + nib(*b0)?,
        )),
        _ => None,
    }
}

fn parse_channels(body: &str) -> Option<Color> {
    let mut parts = body.split(',').map(str::trim);

    let r = parts.next()?.parse::<u8>().ok()?;
    let g = parts.next()?.parse::<u8>().ok()?;
    let b = parts.next()?.parse::<u8>().ok()?;

    let a = match parts.next() {
        None => 255,
        Some(raw) => {
            let a = raw.parse::<f32>().ok()?;
            if !(0.0..=1.0).contains(&a) {
                return None;
            }
            (a * 255.0).round() as u8
        }
    };

    if parts.next().is_some() {
        return None;
    }

    Some(Color::rgba(r, g, b, a))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── packing ───────────────────────────────────────────────────────────

    #[test]
    fn pack_channel_order_is_little_endian_rgba() {
        let c = Color::rgba(0x11, 0x22, 0x33, 0x44);
        assert_eq!(c.pack(), 0x4433_2211);
        assert_eq!(c.pack().to_le_bytes(), [0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn pack_opaque_red() {
        assert_eq!(Color::rgb(255, 0, 0).pack(), 0xFF00_00FF);
    }

    #[test]
    fn attribute_lane_preserves_bits() {
        let c = Color::rgba(0xDE, 0xAD, 0xBE, 0xEF);
        assert_eq!(c.to_attribute().to_bits(), c.pack());
    }

    #[test]
    fn attribute_lane_survives_a_nan_pattern() {
        // 0xFFFF_FFFF is a NaN as f32; the bits must still round-trip.
        let c = Color::rgba(255, 255, 255, 255);
        assert!(c.to_attribute().is_nan());
        assert_eq!(c.to_attribute().to_bits(), 0xFFFF_FFFF);
    }

    // ── parsing ───────────────────────────────────────────────────────────

    #[test]
    fn parse_long_hex() {
        assert_eq!("#ff8000".parse::<Color>().unwrap(), Color::rgb(255, 128, 0));
    }

    #[test]
    fn parse_short_hex_expands_nibbles() {
        assert_eq!("#f80".parse::<Color>().unwrap(), Color::rgb(255, 136, 0));
    }

    #[test]
    fn parse_rgb_functional() {
        assert_eq!(
            "rgb(1, 2, 3)".parse::<Color>().unwrap(),
            Color::rgb(1, 2, 3)
        );
    }

    #[test]
    fn parse_rgba_functional() {
        assert_eq!(
            "rgba(10, 20, 30, 0.5)".parse::<Color>().unwrap(),
            Color::rgba(10, 20, 30, 128)
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Color>().is_err());
        assert!("#12345".parse::<Color>().is_err());
        assert!("rgb(1,2)".parse::<Color>().is_err());
        assert!("rgba(1,2,3,4,5)".parse::<Color>().is_err());
        assert!("rgba(1,2,3,2.0)".parse::<Color>().is_err());
        assert!("hsl(120, 50%, 50%)".parse::<Color>().is_err());
    }
}
