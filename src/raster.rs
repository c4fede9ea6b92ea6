//! Rasterization of measured text onto a surface.
//!
//! Drawing is two-pass when a drop shadow is requested: the first pass
//! renders the text in black far off-surface with the surface's shadow
//! state offset back on-surface, so only the cast shadow lands in the
//! visible area; the second pass renders the real fill and stroke with
//! shadows disabled. This keeps the shadow underneath both fill and
//! stroke instead of layered between them.

use glam::vec2;

use crate::{
    color::{hex2srgba, string2hex},
    metrics::{TextMeasurer, TextMetrics},
    style::{Align, Fill, GradientType, TextStyle},
    surface::{GradientStop, LinearGradient, Paint, Shadow, Surface, SurfaceError},
};

/// Rasterizes `text` under `style` onto `surface`, resizing it to fit.
///
/// The surface ends up `(width + 2 * padding) * resolution` pixels
/// wide (and the equivalent high), with a uniform scale of
/// `resolution` applied so all further coordinates are logical pixels.
/// Returns the metrics the draw was based on.
pub fn draw_text<S: Surface>(
    surface: &mut S,
    measurer: &mut TextMeasurer,
    text: &str,
    style: &TextStyle,
    resolution: f32,
) -> Result<TextMetrics, SurfaceError> {
    surface.ready()?;

    let font = style.to_font_string();

    // a lone space stands in for empty text so the surface keeps
    // usable dimensions
    let measured = measurer.measure(
        if text.is_empty() { " " } else { text },
        style,
        Some(style.word_wrap()),
        surface,
    )?;

    surface.resize(
        ((measured.width.max(1.) + 2. * style.padding()) * resolution).ceil() as u32,
        ((measured.height.max(1.) + 2. * style.padding()) * resolution).ceil() as u32,
    );
    surface.set_scale(resolution);
    surface.clear(0., 0., surface.width() as f32, surface.height() as f32);

    surface.set_font(&font);
    surface.set_line_width(style.stroke_thickness());
    surface.set_baseline(style.text_baseline());
    surface.set_line_join(style.line_join());
    surface.set_miter_limit(style.miter_limit());

    let passes = if style.drop_shadow() { 2 } else { 1 };
    for pass in 0..passes {
        let shadow_pass = style.drop_shadow() && pass == 0;
        // push the shadow-pass text far off-surface and pull the cast
        // shadow back by the same amount
        let text_offset = if shadow_pass { measured.height * 2. } else { 0. };
        let shadow_offset = text_offset * resolution;

        if shadow_pass {
            surface.set_fill(Paint::Solid("black".to_owned()));
            surface.set_stroke(Paint::Solid("black".to_owned()));

            let hex = string2hex(style.drop_shadow_color()).unwrap_or(0);
            surface.set_shadow(Some(Shadow {
                color: hex2srgba(hex, style.drop_shadow_alpha()),
                blur: style.drop_shadow_blur(),
                offset: vec2(
                    style.drop_shadow_angle().cos() * style.drop_shadow_distance(),
                    style.drop_shadow_angle().sin() * style.drop_shadow_distance()
                        + shadow_offset,
                ),
            }));
        } else {
            let paint = fill_paint(
                surface.width(),
                surface.height(),
                style,
                &measured.lines,
                resolution,
            );
            surface.set_fill(paint);
            surface.set_stroke(Paint::Solid(style.stroke().to_owned()));
            surface.set_shadow(None);
        }

        for (i, line) in measured.lines.iter().enumerate() {
            let mut line_x = style.stroke_thickness() / 2.;
            let line_y = style.stroke_thickness() / 2.
                + i as f32 * measured.line_height
                + measured.font_metrics.ascent;

            match style.align() {
                Align::Left => {}
                Align::Center => {
                    line_x += (measured.max_line_width - measured.line_widths[i]) / 2.
                }
                Align::Right => line_x += measured.max_line_width - measured.line_widths[i],
            }

            if !style.stroke().is_empty() && style.stroke_thickness() > 0. {
                draw_letter_spacing(
                    surface,
                    style,
                    line,
                    line_x + style.padding(),
                    line_y + style.padding() - text_offset,
                    true,
                );
            }

            draw_letter_spacing(
                surface,
                style,
                line,
                line_x + style.padding(),
                line_y + style.padding() - text_offset,
                false,
            );
        }
    }

    if style.trim() {
        trim_surface(surface);
    }

    Ok(measured)
}

/// Resolves the fill paint for the non-shadow pass. Single colors pass
/// through; color arrays become a linear gradient across the surface.
fn fill_paint(
    surface_width: u32,
    surface_height: u32,
    style: &TextStyle,
    lines: &[String],
    resolution: f32,
) -> Paint {
    let colors = match style.fill() {
        Fill::Solid(color) => return Paint::Solid(color.clone()),
        Fill::Gradient(colors) if colors.is_empty() => return Paint::Solid("black".to_owned()),
        Fill::Gradient(colors) if colors.len() == 1 => return Paint::Solid(colors[0].clone()),
        Fill::Gradient(colors) => colors,
    };

    let width = (surface_width as f32 / resolution).ceil();
    let height = (surface_height as f32 / resolution).ceil();

    let mut fill = colors.clone();
    let mut stops = style.fill_gradient_stops().to_vec();

    // absent explicit stops, space the colors evenly: 3 colors sit at
    // 0.25, 0.5 and 0.75
    if stops.is_empty() {
        let divisor = (fill.len() + 1) as f32;
        for i in 1..fill.len() + 1 {
            stops.push(i as f32 / divisor);
        }
    }

    // pin the first color at 0 and the last at 1 so a repeated
    // gradient cannot bleed from one line into the next
    fill.insert(0, colors[0].clone());
    stops.insert(0, 0.);
    fill.push(colors[colors.len() - 1].clone());
    stops.push(1.);

    match style.fill_gradient_type() {
        GradientType::LinearVertical => {
            // top center to bottom center, repeated so every line of
            // text shows the same vertical gradient
            let line_count = lines.len() as f32;
            let total = ((fill.len() + 1) * lines.len()) as f32;
            let mut current = 0f32;

            let mut gradient_stops = Vec::new();
            for i in 0..lines.len() {
                current += 1.;
                for (j, color) in fill.iter().enumerate() {
                    let offset = match stops.get(j) {
                        Some(&stop) => stop / line_count + i as f32 / line_count,
                        None => current / total,
                    };
                    gradient_stops.push(GradientStop {
                        offset,
                        color: color.clone(),
                    });
                    current += 1.;
                }
            }

            Paint::LinearGradient(LinearGradient {
                start: vec2(width / 2., 0.),
                end: vec2(width / 2., height),
                stops: gradient_stops,
            })
        }
        GradientType::LinearHorizontal => {
            // center left to center right; line count is irrelevant to
            // an even horizontal spread
            let total = (fill.len() + 1) as f32;
            let mut current = 1f32;

            let mut gradient_stops = Vec::new();
            for (j, color) in fill.iter().enumerate() {
                let offset = stops.get(j).copied().unwrap_or(current / total);
                gradient_stops.push(GradientStop {
                    offset,
                    color: color.clone(),
                });
                current += 1.;
            }

            Paint::LinearGradient(LinearGradient {
                start: vec2(0., height / 2.),
                end: vec2(width, height / 2.),
                stops: gradient_stops,
            })
        }
    }
}

/// Draws one line, stroked or filled, honoring letter-spacing.
///
/// With a non-zero spacing each character is drawn separately and the
/// pen advances by the width delta of successive substring
/// measurements plus the spacing; summing per-character widths instead
/// would drift from kerning-aware measurement.
fn draw_letter_spacing<S: Surface>(
    surface: &mut S,
    style: &TextStyle,
    text: &str,
    x: f32,
    y: f32,
    is_stroke: bool,
) {
    let letter_spacing = style.letter_spacing();

    if letter_spacing == 0. {
        if is_stroke {
            surface.stroke_text(text, x, y);
        } else {
            surface.fill_text(text, x, y);
        }
        return;
    }

    let mut pen = x;
    let mut previous_width = surface.measure(text);
    let mut glyph = [0u8; 4];
    for (byte_index, c) in text.char_indices() {
        let glyph = c.encode_utf8(&mut glyph);
        if is_stroke {
            surface.stroke_text(glyph, pen, y);
        } else {
            surface.fill_text(glyph, pen, y);
        }
        let rest = &text[byte_index + c.len_utf8()..];
        let current_width = surface.measure(rest);
        pen += previous_width - current_width + letter_spacing;
        previous_width = current_width;
    }
}

/// Shrinks the surface to the bounding box of its non-transparent
/// pixels. A fully transparent surface is left untouched.
fn trim_surface<S: Surface>(surface: &mut S) {
    let width = surface.width();
    let height = surface.height();
    let pixels = match surface.read_pixels(0, 0, width, height) {
        Some(pixels) => pixels,
        None => {
            log::warn!("pixel readback unavailable; skipping trim");
            return;
        }
    };

    // (left, right, top, bottom); right exclusive, bottom inclusive
    let mut bound: Option<(u32, u32, u32, u32)> = None;
    for (i, alpha) in pixels.data.iter().skip(3).step_by(4).enumerate() {
        if *alpha == 0 {
            continue;
        }
        let x = i as u32 % width;
        let y = i as u32 / width;
        bound = Some(match bound {
            None => (x, x + 1, y, y),
            Some((left, right, top, bottom)) => (
                left.min(x),
                if right < x { x + 1 } else { right },
                top,
                bottom.max(y),
            ),
        });
    }

    if let Some((left, right, top, bottom)) = bound {
        let trimmed_width = right - left;
        let trimmed_height = bottom - top + 1;
        if let Some(cropped) = surface.read_pixels(left, top, trimmed_width, trimmed_height) {
            surface.resize(trimmed_width, trimmed_height);
            surface.write_pixels(0, 0, &cropped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::testing::MockSurface;

    fn styled(configure: impl FnOnce(&mut TextStyle)) -> TextStyle {
        let mut style = TextStyle::new();
        configure(&mut style);
        style
    }

    fn draw(text: &str, style: &TextStyle) -> (MockSurface, TextMetrics) {
        let mut surface = MockSurface::new();
        let mut measurer = TextMeasurer::new();
        let metrics = draw_text(&mut surface, &mut measurer, text, style, 1.).unwrap();
        (surface, metrics)
    }

    #[test]
    fn surface_sized_from_metrics_and_padding() {
        let (surface, metrics) = draw("ab", &styled(|s| s.set_padding(4.)));
        assert_eq!(metrics.width, 20.);
        assert_eq!(surface.width(), 28);
        assert_eq!(surface.height(), (metrics.height + 8.) as u32);
    }

    #[test]
    fn resolution_scales_physical_dimensions() {
        let mut surface = MockSurface::new();
        let mut measurer = TextMeasurer::new();
        let style = TextStyle::new();
        draw_text(&mut surface, &mut measurer, "ab", &style, 2.).unwrap();
        assert_eq!(surface.width(), 40);
    }

    #[test]
    fn lines_are_baseline_positioned() {
        let (surface, metrics) = draw("a\nb", &TextStyle::new());
        // ascent 8, line height 10
        let positions: Vec<(f32, f32)> = surface
            .fill_calls
            .iter()
            .filter(|(text, _, _)| text == "a" || text == "b")
            .map(|&(_, x, y)| (x, y))
            .collect();
        assert_eq!(positions, vec![(0., 8.), (0., 18.)]);
        assert_eq!(metrics.lines.len(), 2);
    }

    #[test]
    fn right_alignment_offsets_short_lines() {
        let (surface, _) = draw(
            "abc\nz",
            &styled(|s| s.set_align(Align::Right)),
        );
        let (_, x, _) = surface
            .fill_calls
            .iter()
            .find(|(text, _, _)| text == "z")
            .unwrap();
        // max line 30px, this line 10px
        assert_eq!(*x, 20.);
    }

    #[test]
    fn letter_spacing_advances_by_substring_deltas() {
        let (surface, _) = draw("ab", &styled(|s| s.set_letter_spacing(2.)));
        let glyphs: Vec<(String, f32)> = surface
            .fill_calls
            .iter()
            .filter(|(text, _, _)| text == "a" || text == "b")
            .map(|(text, x, _)| (text.clone(), *x))
            .collect();
        assert_eq!(glyphs, vec![("a".to_owned(), 0.), ("b".to_owned(), 12.)]);
    }

    #[test]
    fn shadow_pass_draws_off_surface_then_clears() {
        let (surface, metrics) = draw("a", &styled(|s| s.set_drop_shadow(true)));
        let offset = metrics.height * 2.;
        let ys: Vec<f32> = surface
            .fill_calls
            .iter()
            .filter(|(text, _, _)| text == "a")
            .map(|&(_, _, y)| y)
            .collect();
        assert_eq!(ys, vec![8. - offset, 8.]);

        // pass 1 set a shadow decomposed from the style's color/angle,
        // pass 2 cleared it again
        let first = surface.shadow_history[0].as_ref().unwrap();
        assert_eq!(first.color.alpha, 1.);
        let angle = std::f32::consts::PI / 6.;
        assert!((first.offset.x - angle.cos() * 5.).abs() < 1e-5);
        assert!((first.offset.y - (angle.sin() * 5. + offset)).abs() < 1e-5);
        assert_eq!(surface.shadow_history[1], None);
        assert!(surface.shadow.is_none());
    }

    #[test]
    fn trim_shrinks_to_opaque_extent() {
        let (surface, _) = draw(
            "a",
            &styled(|s| {
                s.set_padding(20.);
                s.set_trim(true);
            }),
        );
        // a mock glyph box is 10x10; the right bound only widens when
        // strictly passed, so an even run of opaque columns comes out
        // one column narrow
        assert_eq!(surface.width(), 9);
        assert_eq!(surface.height(), 10);
        assert_eq!(surface.pixel(0, 0)[3], 255);
    }

    #[test]
    fn trim_leaves_transparent_surface_untouched() {
        let (surface, _) = draw("", &styled(|s| s.set_trim(true)));
        // empty text renders a bare space: nothing opaque, no resize
        assert_eq!(surface.width(), 10);
        assert_eq!(surface.height(), 10);
    }

    #[test]
    fn gradient_pins_first_and_last_colors() {
        for line_count in 1..=4usize {
            let lines = vec!["x".to_owned(); line_count];
            let style = styled(|s| s.set_fill(Fill::gradient([0xff0000, 0x0000ff])));
            let paint = fill_paint(100, 40, &style, &lines, 1.);
            let gradient = match paint {
                Paint::LinearGradient(gradient) => gradient,
                other => panic!("expected gradient, got {:?}", other),
            };
            let first = gradient.stops.first().unwrap();
            assert_eq!((first.offset, first.color.as_str()), (0., "#ff0000"));
            let last = gradient.stops.last().unwrap();
            assert_eq!((last.offset, last.color.as_str()), (1., "#0000ff"));
        }
    }

    #[test]
    fn vertical_gradient_repeats_per_line() {
        let lines = vec!["x".to_owned(), "y".to_owned()];
        let style = styled(|s| s.set_fill(Fill::gradient([0x000000, 0xffffff])));
        let paint = fill_paint(100, 40, &style, &lines, 1.);
        let gradient = match paint {
            Paint::LinearGradient(gradient) => gradient,
            other => panic!("expected gradient, got {:?}", other),
        };
        // two lines: the pinned color pattern restarts at 0.5
        assert!(gradient.stops.iter().any(|s| s.offset == 0.5));
        assert_eq!(gradient.start.x, gradient.end.x);
    }

    #[test]
    fn horizontal_gradient_spans_once() {
        let lines = vec!["x".to_owned(), "y".to_owned()];
        let style = styled(|s| {
            s.set_fill(Fill::gradient([0x000000, 0xffffff]));
            s.set_fill_gradient_type(GradientType::LinearHorizontal);
        });
        let paint = fill_paint(90, 40, &style, &lines, 1.);
        let gradient = match paint {
            Paint::LinearGradient(gradient) => gradient,
            other => panic!("expected gradient, got {:?}", other),
        };
        let offsets: Vec<f32> = gradient.stops.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0., 1. / 3., 2. / 3., 1.]);
        assert_eq!(gradient.start.y, gradient.end.y);
    }

    #[test]
    fn single_color_gradient_degrades_to_solid() {
        let style = styled(|s| s.set_fill(Fill::gradient([0xff0000])));
        let paint = fill_paint(10, 10, &style, &["x".to_owned()], 1.);
        assert_eq!(paint, Paint::Solid("#ff0000".to_owned()));
    }

    #[test]
    fn explicit_stops_are_respected() {
        let style = styled(|s| {
            s.set_fill(Fill::gradient([0x000000, 0xffffff]));
            s.set_fill_gradient_stops(vec![0.1, 0.9]);
            s.set_fill_gradient_type(GradientType::LinearHorizontal);
        });
        let paint = fill_paint(90, 40, &style, &["x".to_owned()], 1.);
        let gradient = match paint {
            Paint::LinearGradient(gradient) => gradient,
            other => panic!("expected gradient, got {:?}", other),
        };
        let offsets: Vec<f32> = gradient.stops.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0., 0.1, 0.9, 1.]);
    }
}
