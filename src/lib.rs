//! A text layout and rasterization engine over a 2D raster surface.
//! Measures styled text (font probing, whitespace handling, greedy
//! word-wrap), rasterizes it with fills, gradients, strokes and drop
//! shadows, and keeps retained text nodes up to date through style
//! revision tracking.

mod color;
mod metrics;
mod raster;
mod style;
mod surface;
mod text;

pub use color::{hex2rgb, hex2rgb_into, hex2string, rgb2hex, string2hex, ColorSpec};
pub use metrics::{
    is_breaking_space, is_newline, FontMetrics, FontMetricsCache, TextMeasurer, TextMetrics,
    WrapPolicy,
};
pub use raster::draw_text;
pub use style::{
    Align, Fill, FontSize, FontStyle, FontVariant, GradientType, TextStyle, WhiteSpace,
};
pub use surface::{
    Baseline, GradientStop, LinearGradient, LineJoin, Paint, Pixels, Shadow, Surface, SurfaceError,
};
pub use text::Text;
