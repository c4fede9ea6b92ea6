//! The raster surface capability consumed by the engine.
//!
//! The engine never talks to a GPU or a windowing system directly; it
//! draws through [`Surface`], a 2D-canvas-shaped trait that a host
//! implements on top of whatever raster backend it has. The engine's
//! output is the surface's pixel contents plus the metrics that
//! produced them.

use glam::Vec2;
use palette::Srgba;

/// The surface could not provide a usable 2D drawing context.
///
/// Fatal to the operation in progress; measurement and drawing fail
/// fast instead of proceeding with a dead context.
#[derive(Debug, thiserror::Error)]
#[error("the raster surface could not provide a usable 2D drawing context")]
pub struct SurfaceError;

/// A fill or stroke paint.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    /// A solid CSS-style color string, e.g. `"#ff1010"` or `"black"`.
    Solid(String),
    LinearGradient(LinearGradient),
}

/// A linear gradient between two points on the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub start: Vec2,
    pub end: Vec2,
    pub stops: Vec<GradientStop>,
}

/// A single color stop of a [`LinearGradient`].
#[derive(Debug, Clone, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient axis, in `[0, 1]`.
    pub offset: f32,
    pub color: String,
}

/// Cast-shadow state applied to subsequent text draws.
#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    pub color: Srgba<f32>,
    pub blur: f32,
    pub offset: Vec2,
}

/// How stroked corners are joined.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

impl Default for LineJoin {
    fn default() -> Self {
        LineJoin::Miter
    }
}

/// The baseline text is anchored to when drawn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Baseline {
    Alphabetic,
    Top,
    Hanging,
    Middle,
    Ideographic,
    Bottom,
}

impl Default for Baseline {
    fn default() -> Self {
        Baseline::Alphabetic
    }
}

/// A rectangle of RGBA8 pixel data read from or written to a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixels {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA bytes, `width * height * 4` long.
    pub data: Vec<u8>,
}

/// A 2D raster drawing surface.
///
/// Semantics follow the HTML canvas model: [`resize`](Surface::resize)
/// reallocates the backing pixel buffer and resets the transform and
/// all paint state, coordinates are in logical pixels scaled by
/// [`set_scale`](Surface::set_scale), and text metrics come from
/// whatever font machinery backs the surface.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Reallocates the backing buffer. Resets the scale transform and
    /// all paint state to defaults and clears the pixels.
    fn resize(&mut self, width: u32, height: u32);

    /// Applies a uniform scale to all subsequent drawing coordinates.
    fn set_scale(&mut self, factor: f32);

    /// Clears a region to transparent black.
    fn clear(&mut self, x: f32, y: f32, width: f32, height: f32);

    /// Fills a region with the current fill paint.
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    /// Sets the font for subsequent measurement and text drawing, as a
    /// CSS-style font specification string.
    fn set_font(&mut self, font: &str);

    fn set_fill(&mut self, paint: Paint);
    fn set_stroke(&mut self, paint: Paint);
    fn set_line_width(&mut self, width: f32);
    fn set_line_join(&mut self, join: LineJoin);
    fn set_miter_limit(&mut self, limit: f32);
    fn set_baseline(&mut self, baseline: Baseline);

    /// Sets or clears the cast-shadow state for subsequent text draws.
    fn set_shadow(&mut self, shadow: Option<Shadow>);

    /// Measures the advance width of `text` under the current font,
    /// in logical pixels.
    fn measure(&mut self, text: &str) -> f32;

    /// Draws filled text with its baseline origin at `(x, y)`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32);

    /// Draws stroked text with its baseline origin at `(x, y)`.
    fn stroke_text(&mut self, text: &str, x: f32, y: f32);

    /// Reads back a rectangle of pixels, in physical (unscaled) units.
    ///
    /// Returns `None` when the backend disallows pixel extraction;
    /// callers degrade to approximate font metrics and skip trimming.
    fn read_pixels(&mut self, x: u32, y: u32, width: u32, height: u32) -> Option<Pixels>;

    /// Writes a rectangle of pixels at `(x, y)`, bypassing the
    /// transform and paint state.
    fn write_pixels(&mut self, x: u32, y: u32, pixels: &Pixels);

    /// Confirms the surface has a usable 2D drawing context.
    ///
    /// Called once at the start of every measurement or draw; the
    /// default always succeeds. Backends that can lack or lose their
    /// context report [`SurfaceError`] here so the operation fails
    /// fast.
    fn ready(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }
}
