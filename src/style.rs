//! Text style configuration.
//!
//! A [`TextStyle`] can back several [`Text`](crate::Text) nodes at
//! once; every mutation bumps a monotonic revision counter
//! ([`TextStyle::style_id`]) which nodes compare against their last
//! observed revision to decide whether a re-render is needed. Setting
//! a field to its current value is a no-op and does not bump the
//! counter.

use serde::{Deserialize, Serialize};

use crate::{
    color::ColorSpec,
    surface::{Baseline, LineJoin},
};

/// Horizontal alignment for multiline text. Does not affect
/// single-line text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Default for Align {
    fn default() -> Self {
        Align::Left
    }
}

/// Direction of a gradient fill built from multiple colors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradientType {
    LinearVertical,
    LinearHorizontal,
}

impl Default for GradientType {
    fn default() -> Self {
        GradientType::LinearVertical
    }
}

/// How newlines and spaces are handled during measurement.
///
///  value      | New lines | Spaces
///  ---        | ---       | ---
/// `Normal`    | Collapse  | Collapse
/// `Pre`       | Preserve  | Preserve
/// `PreLine`   | Preserve  | Collapse
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WhiteSpace {
    Normal,
    Pre,
    PreLine,
}

impl Default for WhiteSpace {
    fn default() -> Self {
        WhiteSpace::Pre
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontStyle {
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    fn as_css(self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
            FontStyle::Oblique => "oblique",
        }
    }
}

impl Default for FontStyle {
    fn default() -> Self {
        FontStyle::Normal
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontVariant {
    Normal,
    SmallCaps,
}

impl FontVariant {
    fn as_css(self) -> &'static str {
        match self {
            FontVariant::Normal => "normal",
            FontVariant::SmallCaps => "small-caps",
        }
    }
}

impl Default for FontVariant {
    fn default() -> Self {
        FontVariant::Normal
    }
}

/// A font size: a pixel value, or a raw CSS size such as `"20pt"`,
/// `"160%"` or `"1.6em"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FontSize {
    Px(f32),
    Raw(String),
}

impl FontSize {
    pub fn to_css(&self) -> String {
        match self {
            FontSize::Px(px) => format!("{}px", px),
            FontSize::Raw(raw) => raw.clone(),
        }
    }

    /// Best-effort pixel value, used when pixel-based font probing is
    /// unavailable. Raw sizes yield their numeric prefix, or zero.
    pub fn px(&self) -> f32 {
        match self {
            FontSize::Px(px) => *px,
            FontSize::Raw(raw) => {
                let digits: String = raw
                    .chars()
                    .take_while(|c| c.is_ascii_digit() || *c == '.')
                    .collect();
                digits.parse().unwrap_or(0.)
            }
        }
    }
}

impl From<f32> for FontSize {
    fn from(px: f32) -> Self {
        FontSize::Px(px)
    }
}

impl From<&str> for FontSize {
    fn from(raw: &str) -> Self {
        FontSize::Raw(raw.to_owned())
    }
}

/// A text fill: a single color, or the colors of a gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fill {
    Solid(String),
    Gradient(Vec<String>),
}

impl Fill {
    /// Builds a gradient fill, normalizing each color the same way
    /// single-color fields are.
    pub fn gradient<I, C>(colors: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColorSpec>,
    {
        Fill::Gradient(
            colors
                .into_iter()
                .map(|c| c.into().to_color_string())
                .collect(),
        )
    }
}

impl From<ColorSpec> for Fill {
    fn from(color: ColorSpec) -> Self {
        Fill::Solid(color.to_color_string())
    }
}

impl From<u32> for Fill {
    fn from(hex: u32) -> Self {
        Fill::from(ColorSpec::Hex(hex))
    }
}

impl From<&str> for Fill {
    fn from(css: &str) -> Self {
        Fill::from(ColorSpec::from(css))
    }
}

impl From<String> for Fill {
    fn from(css: String) -> Self {
        Fill::from(ColorSpec::Css(css))
    }
}

const GENERIC_FONT_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
];

/// Style parameters for laying out and rasterizing text.
///
/// Every settable field participates in revision tracking: a setter
/// that changes the stored value increments [`style_id`](Self::style_id)
/// by exactly one, and a setter passed the current value leaves it
/// untouched. Out-of-range values are accepted unvalidated and produce
/// degenerate but defined behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(skip)]
    style_id: u64,

    align: Align,
    break_words: bool,
    drop_shadow: bool,
    drop_shadow_alpha: f32,
    drop_shadow_angle: f32,
    drop_shadow_blur: f32,
    drop_shadow_color: String,
    drop_shadow_distance: f32,
    fill: Fill,
    fill_gradient_type: GradientType,
    fill_gradient_stops: Vec<f32>,
    font_family: Vec<String>,
    font_size: FontSize,
    font_style: FontStyle,
    font_variant: FontVariant,
    font_weight: String,
    leading: f32,
    letter_spacing: f32,
    line_height: f32,
    line_join: LineJoin,
    miter_limit: f32,
    padding: f32,
    stroke: String,
    stroke_thickness: f32,
    text_baseline: Baseline,
    trim: bool,
    white_space: WhiteSpace,
    word_wrap: bool,
    word_wrap_width: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            style_id: 0,
            align: Align::Left,
            break_words: false,
            drop_shadow: false,
            drop_shadow_alpha: 1.,
            drop_shadow_angle: std::f32::consts::PI / 6.,
            drop_shadow_blur: 0.,
            drop_shadow_color: "black".to_owned(),
            drop_shadow_distance: 5.,
            fill: Fill::Solid("black".to_owned()),
            fill_gradient_type: GradientType::LinearVertical,
            fill_gradient_stops: Vec::new(),
            font_family: vec!["Arial".to_owned()],
            font_size: FontSize::Px(26.),
            font_style: FontStyle::Normal,
            font_variant: FontVariant::Normal,
            font_weight: "normal".to_owned(),
            leading: 0.,
            letter_spacing: 0.,
            line_height: 0.,
            line_join: LineJoin::Miter,
            miter_limit: 10.,
            padding: 0.,
            stroke: "black".to_owned(),
            stroke_thickness: 0.,
            text_baseline: Baseline::Alphabetic,
            trim: false,
            white_space: WhiteSpace::Pre,
            word_wrap: false,
            word_wrap_width: 100.,
        }
    }
}

macro_rules! setter {
    ($(#[$doc:meta])* $field:ident, $set:ident: $ty:ty) => {
        $(#[$doc])*
        pub fn $field(&self) -> $ty {
            self.$field
        }

        pub fn $set(&mut self, value: $ty) {
            if self.$field != value {
                self.$field = value;
                self.bump();
            }
        }
    };
}

impl TextStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current revision of this style. Monotonically increasing;
    /// bumped exactly once per value-changing mutation.
    pub fn style_id(&self) -> u64 {
        self.style_id
    }

    /// Restores all fields to their defaults.
    ///
    /// Counts as a mutation: if any field actually changes, the
    /// revision advances so observing nodes re-render. Resetting an
    /// already-default style is a no-op.
    pub fn reset(&mut self) {
        let defaults = Self {
            style_id: self.style_id,
            ..Self::default()
        };
        if *self != defaults {
            *self = defaults;
            self.bump();
        }
    }

    fn bump(&mut self) {
        self.style_id += 1;
    }

    setter!(
        /// Alignment for multiline text.
        align, set_align: Align
    );
    setter!(
        /// Whether lines may be broken within words. Requires
        /// `word_wrap` to take effect.
        break_words, set_break_words: bool
    );
    setter!(
        /// Whether a drop shadow is cast behind the text.
        drop_shadow, set_drop_shadow: bool
    );
    setter!(drop_shadow_alpha, set_drop_shadow_alpha: f32);
    setter!(
        /// Angle of the drop shadow offset, in radians.
        drop_shadow_angle, set_drop_shadow_angle: f32
    );
    setter!(drop_shadow_blur, set_drop_shadow_blur: f32);
    setter!(drop_shadow_distance, set_drop_shadow_distance: f32);
    setter!(fill_gradient_type, set_fill_gradient_type: GradientType);
    setter!(
        /// Uniform extra gap after each rendered character, applied
        /// during both measurement and drawing.
        letter_spacing, set_letter_spacing: f32
    );
    setter!(
        /// Vertical space a line occupies. Zero means "derive from
        /// font metrics plus stroke thickness".
        line_height, set_line_height: f32
    );
    setter!(
        /// Extra space between lines, on top of the line height.
        leading, set_leading: f32
    );
    setter!(line_join, set_line_join: LineJoin);
    setter!(miter_limit, set_miter_limit: f32);
    setter!(
        /// Padding added to all sides of the rasterized output.
        /// Prevents glyphs that overhang their advance from being
        /// cropped.
        padding, set_padding: f32
    );
    setter!(
        /// Stroke outline thickness. Zero disables the stroke pass.
        stroke_thickness, set_stroke_thickness: f32
    );
    setter!(text_baseline, set_text_baseline: Baseline);
    setter!(
        /// Whether to crop transparent borders off the rasterized
        /// output.
        trim, set_trim: bool
    );
    setter!(white_space, set_white_space: WhiteSpace);
    setter!(word_wrap, set_word_wrap: bool);
    setter!(
        /// The pixel width at which text wraps. Requires `word_wrap`.
        word_wrap_width, set_word_wrap_width: f32
    );

    /// Color of the drop shadow.
    pub fn drop_shadow_color(&self) -> &str {
        &self.drop_shadow_color
    }

    pub fn set_drop_shadow_color(&mut self, color: impl Into<ColorSpec>) {
        let color = color.into().to_color_string();
        if self.drop_shadow_color != color {
            self.drop_shadow_color = color;
            self.bump();
        }
    }

    /// The text fill: a single color, or gradient stop colors.
    pub fn fill(&self) -> &Fill {
        &self.fill
    }

    pub fn set_fill(&mut self, fill: impl Into<Fill>) {
        let fill = fill.into();
        if self.fill != fill {
            self.fill = fill;
            self.bump();
        }
    }

    /// Explicit gradient stop positions in `[0, 1]`. When empty, stops
    /// are spaced evenly.
    pub fn fill_gradient_stops(&self) -> &[f32] {
        &self.fill_gradient_stops
    }

    pub fn set_fill_gradient_stops(&mut self, stops: Vec<f32>) {
        // element-wise comparison, not reference identity
        if self.fill_gradient_stops != stops {
            self.fill_gradient_stops = stops;
            self.bump();
        }
    }

    /// The font family preference list.
    pub fn font_family(&self) -> &[String] {
        &self.font_family
    }

    /// Sets the font family from a comma-separated list, e.g.
    /// `"Helvetica Neue, Arial, sans-serif"`.
    pub fn set_font_family(&mut self, family: &str) {
        self.set_font_families(family.split(',').map(|f| f.trim().to_owned()).collect());
    }

    pub fn set_font_families(&mut self, families: Vec<String>) {
        if self.font_family != families {
            self.font_family = families;
            self.bump();
        }
    }

    pub fn font_size(&self) -> &FontSize {
        &self.font_size
    }

    pub fn set_font_size(&mut self, size: impl Into<FontSize>) {
        let size = size.into();
        if self.font_size != size {
            self.font_size = size;
            self.bump();
        }
    }

    pub fn font_style(&self) -> FontStyle {
        self.font_style
    }

    pub fn set_font_style(&mut self, style: FontStyle) {
        if self.font_style != style {
            self.font_style = style;
            self.bump();
        }
    }

    pub fn font_variant(&self) -> FontVariant {
        self.font_variant
    }

    pub fn set_font_variant(&mut self, variant: FontVariant) {
        if self.font_variant != variant {
            self.font_variant = variant;
            self.bump();
        }
    }

    /// The font weight, as a CSS keyword or numeric string
    /// (`"normal"`, `"bold"`, `"700"`, ...).
    pub fn font_weight(&self) -> &str {
        &self.font_weight
    }

    pub fn set_font_weight(&mut self, weight: &str) {
        if self.font_weight != weight {
            self.font_weight = weight.to_owned();
            self.bump();
        }
    }

    /// The stroke color.
    pub fn stroke(&self) -> &str {
        &self.stroke
    }

    pub fn set_stroke(&mut self, color: impl Into<ColorSpec>) {
        let color = color.into().to_color_string();
        if self.stroke != color {
            self.stroke = color;
            self.bump();
        }
    }

    /// Assembles the canvas font specification string for this style.
    ///
    /// Numeric sizes are rendered in `px`; family names are quoted
    /// unless they already carry quotes or are a generic CSS family.
    pub fn to_font_string(&self) -> String {
        let families: Vec<String> = self
            .font_family
            .iter()
            .map(|family| {
                let family = family.trim();
                if family.contains('"')
                    || family.contains('\'')
                    || GENERIC_FONT_FAMILIES.contains(&family)
                {
                    family.to_owned()
                } else {
                    format!("\"{}\"", family)
                }
            })
            .collect();

        format!(
            "{} {} {} {} {}",
            self.font_style.as_css(),
            self.font_variant.as_css(),
            self.font_weight,
            self.font_size.to_css(),
            families.join(",")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_id_bumps_once_per_change() {
        let mut style = TextStyle::new();
        assert_eq!(style.style_id(), 0);

        style.set_align(Align::Center);
        assert_eq!(style.style_id(), 1);

        // repeating the current value is a no-op
        style.set_align(Align::Center);
        assert_eq!(style.style_id(), 1);

        style.set_font_size(32.);
        assert_eq!(style.style_id(), 2);
    }

    #[test]
    fn color_fields_normalize_before_comparing() {
        let mut style = TextStyle::new();
        style.set_fill(0xff1010);
        assert_eq!(style.style_id(), 1);
        assert_eq!(style.fill(), &Fill::Solid("#ff1010".to_owned()));

        // same color through a different spelling: still a no-op
        style.set_fill("0xff1010");
        assert_eq!(style.style_id(), 1);

        style.set_stroke("0x00ff00");
        assert_eq!(style.stroke(), "#00ff00");
    }

    #[test]
    fn gradient_stops_compare_element_wise() {
        let mut style = TextStyle::new();
        style.set_fill_gradient_stops(vec![0.2, 0.8]);
        assert_eq!(style.style_id(), 1);

        // a fresh but equal vector does not count as a change
        style.set_fill_gradient_stops(vec![0.2, 0.8]);
        assert_eq!(style.style_id(), 1);

        style.set_fill_gradient_stops(vec![0.2, 0.9]);
        assert_eq!(style.style_id(), 2);
    }

    #[test]
    fn clone_copies_arrays_by_value() {
        let mut style = TextStyle::new();
        style.set_fill_gradient_stops(vec![0.5]);

        let mut copy = style.clone();
        copy.set_fill_gradient_stops(vec![0.1, 0.9]);

        assert_eq!(style.fill_gradient_stops(), &[0.5]);
        assert_eq!(copy.fill_gradient_stops(), &[0.1, 0.9]);
    }

    #[test]
    fn reset_restores_defaults_and_counts_as_a_change() {
        let mut style = TextStyle::new();
        style.set_word_wrap(true);
        style.set_word_wrap_width(420.);
        let revision = style.style_id();

        style.reset();
        assert!(!style.word_wrap());
        assert_eq!(style.word_wrap_width(), 100.);
        // observers must see the reset through the revision counter
        assert_eq!(style.style_id(), revision + 1);

        // resetting a default style changes nothing
        style.reset();
        assert_eq!(style.style_id(), revision + 1);
    }

    #[test]
    fn font_string_assembly() {
        let style = TextStyle::new();
        assert_eq!(style.to_font_string(), "normal normal normal 26px \"Arial\"");

        let mut style = TextStyle::new();
        style.set_font_style(FontStyle::Italic);
        style.set_font_weight("bold");
        style.set_font_size("20pt");
        style.set_font_family("Helvetica Neue, sans-serif");
        assert_eq!(
            style.to_font_string(),
            "italic normal bold 20pt \"Helvetica Neue\",sans-serif"
        );
    }

    #[test]
    fn raw_font_size_px_fallback() {
        assert_eq!(FontSize::from(26.).px(), 26.);
        assert_eq!(FontSize::from("20pt").px(), 20.);
        assert_eq!(FontSize::from("big").px(), 0.);
    }
}
