//! Conversions between hexadecimal integer colors, `#rrggbb` strings,
//! and normalized RGB float triples.
//!
//! These mirror the conversions a 2D canvas expects: style fields carry
//! CSS-style color strings, while shadow decomposition and pixel math
//! operate on numeric channels.

use palette::Srgba;

/// Converts a hexadecimal color number to `[r, g, b]` normalized floats.
///
/// ```
/// assert_eq!(inkpad::hex2rgb(0xffffff), [1., 1., 1.]);
/// ```
pub fn hex2rgb(hex: u32) -> [f32; 3] {
    let mut out = [0.; 3];
    hex2rgb_into(hex, &mut out);
    out
}

/// Like [`hex2rgb`], but writes into an existing buffer.
pub fn hex2rgb_into(hex: u32, out: &mut [f32; 3]) {
    out[0] = ((hex >> 16) & 0xFF) as f32 / 255.;
    out[1] = ((hex >> 8) & 0xFF) as f32 / 255.;
    out[2] = (hex & 0xFF) as f32 / 255.;
}

/// Converts a hexadecimal color number to a `#rrggbb` string,
/// zero-padded to six digits.
///
/// ```
/// assert_eq!(inkpad::hex2string(0xff00aa), "#ff00aa");
/// assert_eq!(inkpad::hex2string(0x00000f), "#00000f");
/// ```
pub fn hex2string(hex: u32) -> String {
    format!("#{:06x}", hex)
}

/// Parses a `#rrggbb` or `rrggbb` hexadecimal color string.
///
/// Returns `None` on non-hex input. Callers treat a failed parse as
/// black rather than an error, so malformed colors render incorrectly
/// but never crash.
pub fn string2hex(string: &str) -> Option<u32> {
    let digits = string.strip_prefix('#').unwrap_or(string);
    u32::from_str_radix(digits, 16).ok()
}

/// Converts `[r, g, b]` normalized floats back to a hexadecimal number.
///
/// Channels are truncated toward zero, not rounded, to match the
/// inverse of [`hex2rgb`] within one step per channel.
pub fn rgb2hex(rgb: [f32; 3]) -> u32 {
    (((rgb[0] * 255.) as u32) << 16) | (((rgb[1] * 255.) as u32) << 8) | ((rgb[2] * 255.) as u32)
}

/// Builds an `Srgba` color from a hexadecimal number and a separate alpha.
pub(crate) fn hex2srgba(hex: u32, alpha: f32) -> Srgba<f32> {
    let [r, g, b] = hex2rgb(hex);
    Srgba::new(r, g, b, alpha)
}

/// A color-valued style input: either a packed `0xrrggbb` integer
/// or a CSS color string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSpec {
    Hex(u32),
    Css(String),
}

impl ColorSpec {
    /// Normalizes the input to a string the drawing surface understands:
    /// numbers become `#rrggbb`, and a leading `0x` becomes `#`.
    pub fn to_color_string(&self) -> String {
        match self {
            ColorSpec::Hex(hex) => hex2string(*hex),
            ColorSpec::Css(css) => match css.strip_prefix("0x") {
                Some(digits) => format!("#{}", digits),
                None => css.clone(),
            },
        }
    }
}

impl From<u32> for ColorSpec {
    fn from(hex: u32) -> Self {
        ColorSpec::Hex(hex)
    }
}

impl From<&str> for ColorSpec {
    fn from(css: &str) -> Self {
        ColorSpec::Css(css.to_owned())
    }
}

impl From<String> for ColorSpec {
    fn from(css: String) -> Self {
        ColorSpec::Css(css)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_strings() {
        assert_eq!(hex2string(0xfffe01), "#fffe01");
        assert_eq!(hex2string(0x000080), "#000080");
        assert_eq!(hex2string(0), "#000000");
    }

    #[test]
    fn string_to_hex() {
        assert_eq!(string2hex("#ffffff"), Some(0xffffff));
        assert_eq!(string2hex("ff1010"), Some(0xff1010));
        assert_eq!(string2hex("#bogus"), None);
        assert_eq!(string2hex(""), None);
    }

    #[test]
    fn string_round_trip() {
        for _ in 0..1000 {
            let hex = fastrand::u32(0..=0xFFFFFF);
            assert_eq!(string2hex(&hex2string(hex)), Some(hex));
        }
        assert_eq!(string2hex(&hex2string(0)), Some(0));
        assert_eq!(string2hex(&hex2string(0xFFFFFF)), Some(0xFFFFFF));
    }

    #[test]
    fn rgb_round_trip() {
        for _ in 0..1000 {
            let rgb = [fastrand::f32(), fastrand::f32(), fastrand::f32()];
            let back = hex2rgb(rgb2hex(rgb));
            for (a, b) in rgb.iter().zip(back.iter()) {
                // truncation loses at most one 8-bit step per channel
                assert!((a - b).abs() <= 1. / 255., "{:?} vs {:?}", rgb, back);
            }
        }
    }

    #[test]
    fn rgb2hex_truncates() {
        // 0.9999 * 255 = 254.97 truncates to 254, never rounds up
        assert_eq!(rgb2hex([0., 0., 0.9999]), 0x0000fe);
    }

    #[test]
    fn hex2rgb_reuses_buffer() {
        let mut out = [0.5; 3];
        hex2rgb_into(0xff0000, &mut out);
        assert_eq!(out, [1., 0., 0.]);
    }

    #[test]
    fn single_color_normalization() {
        assert_eq!(ColorSpec::from(0xff1010).to_color_string(), "#ff1010");
        assert_eq!(ColorSpec::from("0xff1010").to_color_string(), "#ff1010");
        assert_eq!(ColorSpec::from("rebeccapurple").to_color_string(), "rebeccapurple");
    }
}
