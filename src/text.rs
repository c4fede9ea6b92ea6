//! A retained text node: owns a surface and re-rasterizes it only when
//! the text, style, or resolution actually changed.
//!
//! Style changes are detected lazily through the style's revision
//! counter, so mutating through [`Text::style_mut`] needs no explicit
//! invalidation call; the next [`update`](Text::update) notices the
//! newer revision.

use crate::{
    metrics::{TextMeasurer, TextMetrics},
    raster::draw_text,
    style::TextStyle,
    surface::{Surface, SurfaceError},
};

/// Revision sentinel that never matches a real style revision, forcing
/// the first update to render.
const STALE: u64 = u64::MAX;

/// Text bound to a [`Surface`] it keeps rasterized.
pub struct Text<S: Surface> {
    surface: S,
    measurer: TextMeasurer,
    style: TextStyle,
    text: String,
    dirty: bool,
    observed_style_id: u64,
    resolution: f32,
    auto_resolution: bool,
}

impl<S: Surface> Text<S> {
    /// Takes ownership of `surface` and marks the node dirty; nothing
    /// is rasterized until [`update`](Text::update) runs.
    pub fn new(mut surface: S, text: impl Into<String>, style: TextStyle) -> Result<Self, SurfaceError> {
        surface.ready()?;
        // keep the surface tiny until the first real render sizes it
        surface.resize(3, 3);

        Ok(Self {
            surface,
            measurer: TextMeasurer::new(),
            style,
            text: text.into(),
            dirty: true,
            observed_style_id: STALE,
            resolution: 1.,
            auto_resolution: true,
        })
    }

    /// Re-rasterizes the node if needed.
    ///
    /// Returns the metrics of a render that happened, or `None` when
    /// `respect_dirty` is set and the node was already clean. Passing
    /// `respect_dirty = false` renders unconditionally.
    pub fn update(&mut self, respect_dirty: bool) -> Result<Option<TextMetrics>, SurfaceError> {
        if self.observed_style_id != self.style.style_id() {
            self.dirty = true;
            self.observed_style_id = self.style.style_id();
        }
        if !self.dirty && respect_dirty {
            return Ok(None);
        }

        let metrics = draw_text(
            &mut self.surface,
            &mut self.measurer,
            &self.text,
            &self.style,
            self.resolution,
        )?;
        self.dirty = false;
        Ok(Some(metrics))
    }

    /// Adopts `resolution` from the host when auto-resolution is on,
    /// then renders if anything is out of date.
    pub fn prepare(&mut self, resolution: f32) -> Result<Option<TextMetrics>, SurfaceError> {
        if self.auto_resolution && self.resolution != resolution {
            self.resolution = resolution;
            self.dirty = true;
        }
        self.update(true)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces the node's text. Setting the current text is a no-op.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.text != text {
            self.text = text;
            self.dirty = true;
        }
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// Mutable access to the style; changes are picked up by the next
    /// [`update`](Text::update) through the revision counter.
    pub fn style_mut(&mut self) -> &mut TextStyle {
        &mut self.style
    }

    /// Replaces the whole style and forces a re-render, even when the
    /// new style compares equal to the old one.
    pub fn set_style(&mut self, style: TextStyle) {
        self.style = style;
        self.observed_style_id = STALE;
        self.dirty = true;
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// Pins the render resolution, opting out of automatic adoption in
    /// [`prepare`](Text::prepare).
    pub fn set_resolution(&mut self, resolution: f32) {
        self.auto_resolution = false;
        if self.resolution != resolution {
            self.resolution = resolution;
            self.dirty = true;
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::testing::MockSurface;

    fn node(text: &str) -> Text<MockSurface> {
        Text::new(MockSurface::new(), text, TextStyle::new()).unwrap()
    }

    #[test]
    fn first_update_renders_then_stays_clean() {
        let mut text = node("ab");
        assert!(text.update(true).unwrap().is_some());

        let resizes = text.surface().resizes;
        assert!(text.update(true).unwrap().is_none());
        assert_eq!(text.surface().resizes, resizes);
    }

    #[test]
    fn update_without_respect_dirty_always_renders() {
        let mut text = node("ab");
        text.update(true).unwrap();
        assert!(text.update(false).unwrap().is_some());
    }

    #[test]
    fn style_mutation_is_detected_lazily() {
        let mut text = node("ab");
        text.update(true).unwrap();

        text.style_mut().set_letter_spacing(2.);
        let metrics = text.update(true).unwrap().unwrap();
        assert_eq!(metrics.width, 22.);

        // a no-op mutation leaves the revision, and the node, untouched
        text.style_mut().set_letter_spacing(2.);
        assert!(text.update(true).unwrap().is_none());
    }

    #[test]
    fn set_text_ignores_equal_value() {
        let mut text = node("ab");
        text.update(true).unwrap();

        text.set_text("ab");
        assert!(text.update(true).unwrap().is_none());

        text.set_text("abc");
        let metrics = text.update(true).unwrap().unwrap();
        assert_eq!(metrics.width, 30.);
    }

    #[test]
    fn style_reset_marks_node_dirty() {
        let mut text = node("ab");
        text.style_mut().set_letter_spacing(4.);
        text.update(true).unwrap();

        text.style_mut().reset();
        let metrics = text.update(true).unwrap().unwrap();
        assert_eq!(metrics.width, 20.);
    }

    #[test]
    fn set_style_forces_rerender_even_if_equal() {
        let mut text = node("ab");
        text.update(true).unwrap();

        text.set_style(TextStyle::new());
        assert!(text.update(true).unwrap().is_some());
    }

    #[test]
    fn prepare_adopts_host_resolution_until_pinned() {
        let mut text = node("ab");
        text.prepare(2.).unwrap();
        assert_eq!(text.resolution(), 2.);
        // 20 logical px at 2x
        assert_eq!(text.surface().width(), 40);

        assert!(text.prepare(2.).unwrap().is_none());

        text.set_resolution(3.);
        text.prepare(2.).unwrap();
        assert_eq!(text.resolution(), 3.);
        assert_eq!(text.surface().width(), 60);
    }

    #[test]
    fn dead_surface_is_rejected_up_front() {
        let mut surface = MockSurface::new();
        surface.live = false;
        assert!(Text::new(surface, "ab", TextStyle::new()).is_err());
    }
}
