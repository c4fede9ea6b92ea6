//! Text measurement: font metrics probing, tokenization, whitespace
//! collapsing, and greedy word-wrap.
//!
//! Measurement runs against whatever [`Surface`] the caller provides;
//! only advance widths and (for font probing) pixel readback are
//! required of it.

use ahash::AHashMap;

use crate::{
    style::{TextStyle, WhiteSpace},
    surface::{Baseline, Paint, Surface, SurfaceError},
};

/// Vertical metrics of one font specification, derived empirically by
/// rasterizing a probe string and scanning pixel rows.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FontMetrics {
    /// Distance from the alphabetic baseline to the top of the glyphs.
    pub ascent: f32,
    /// Distance from the alphabetic baseline to the bottom of the glyphs.
    pub descent: f32,
    /// `ascent + descent`.
    pub font_size: f32,
}

/// A cache of [`FontMetrics`] keyed by font specification string.
///
/// Construct one per measurement pipeline and pass it by reference;
/// entries live until explicitly cleared. When substituting fallback
/// fonts at runtime, clear the affected entries to force fresh probes.
///
/// The probe scans for the first non-red pixel row above and below the
/// baseline, so exact values depend on the anti-aliasing behavior of
/// the surface backend; treat small cross-backend differences as
/// inherent imprecision.
#[derive(Debug, Default)]
pub struct FontMetricsCache {
    fonts: AHashMap<String, FontMetrics>,
}

impl FontMetricsCache {
    /// Glyphs with tall ascenders and descenders, drawn to find the
    /// vertical extent of a font.
    pub const METRICS_STRING: &'static str = "|ÉqÅ";
    /// Symbol whose advance width anchors the probe baseline.
    pub const BASELINE_SYMBOL: &'static str = "M";
    pub const BASELINE_MULTIPLIER: f32 = 1.4;

    pub fn new() -> Self {
        Self::default()
    }

    /// Measures the ascent, descent, and font size of a font
    /// specification, probing on `surface` on a cache miss.
    ///
    /// A probe scribbles over and resizes `surface`; callers redraw or
    /// resize afterwards. If the surface disallows pixel readback the
    /// result is all zeros and not cached; callers substitute the
    /// style's declared font size.
    pub fn measure<S: Surface>(&mut self, surface: &mut S, font: &str) -> FontMetrics {
        if let Some(metrics) = self.fonts.get(font) {
            return *metrics;
        }

        log::trace!("probing metrics for font '{}'", font);

        surface.set_font(font);
        let probe = format!("{}{}", Self::METRICS_STRING, Self::BASELINE_SYMBOL);
        let width = surface.measure(&probe).ceil() as u32;
        let baseline_width = surface.measure(Self::BASELINE_SYMBOL).ceil() as u32;
        let height = 2 * baseline_width;
        let baseline = (baseline_width as f32 * Self::BASELINE_MULTIPLIER) as u32;

        surface.resize(width, height);
        surface.set_fill(Paint::Solid("#f00".to_owned()));
        surface.fill_rect(0., 0., width as f32, height as f32);
        // resize reset the paint state, so the font must be set again
        surface.set_font(font);
        surface.set_baseline(Baseline::Alphabetic);
        surface.set_fill(Paint::Solid("#000".to_owned()));
        surface.fill_text(&probe, 0., baseline as f32);

        let pixels = match surface.read_pixels(0, 0, width, height) {
            Some(pixels) => pixels,
            None => {
                log::warn!("pixel readback unavailable; metrics degraded for '{}'", font);
                return FontMetrics {
                    ascent: 0.,
                    descent: 0.,
                    font_size: 0.,
                };
            }
        };
        let data = &pixels.data;
        let row_bytes = (width * 4) as usize;

        // ascent: scan down from the top to the baseline until a
        // non-red pixel appears
        let mut first_inked = baseline;
        'ascent: for i in 0..baseline {
            let row = i as usize * row_bytes;
            for j in (0..row_bytes).step_by(4) {
                if data[row + j] != 255 {
                    first_inked = i;
                    break 'ascent;
                }
            }
        }
        let ascent = baseline - first_inked;

        // descent: scan up from the bottom edge to the baseline
        let mut last_inked = baseline;
        'descent: for i in ((baseline + 1)..=height).rev() {
            let row = (i - 1) as usize * row_bytes;
            for j in (0..row_bytes).step_by(4) {
                if data[row + j] != 255 {
                    last_inked = i;
                    break 'descent;
                }
            }
        }
        let descent = last_inked - baseline;

        let metrics = FontMetrics {
            ascent: ascent as f32,
            descent: descent as f32,
            font_size: (ascent + descent) as f32,
        };
        self.fonts.insert(font.to_owned(), metrics);
        metrics
    }

    /// Drops every cached entry.
    pub fn clear(&mut self) {
        self.fonts.clear();
    }

    /// Drops the entry for one font specification.
    pub fn clear_font(&mut self, font: &str) {
        self.fonts.remove(font);
    }
}

/// The measurement of a block of text under one style.
#[derive(Debug, Clone)]
pub struct TextMetrics {
    /// The text that was measured.
    pub text: String,
    /// The style it was measured with.
    pub style: TextStyle,
    /// Overall width including stroke and drop shadow allowances.
    pub width: f32,
    /// Overall height including stroke and drop shadow allowances.
    pub height: f32,
    /// The wrapped lines, or the raw text split on newlines when
    /// wrapping is disabled.
    pub lines: Vec<String>,
    /// Pixel width of each line, matched to `lines`.
    pub line_widths: Vec<f32>,
    /// Vertical advance per line, leading included.
    pub line_height: f32,
    /// The widest line's width.
    pub max_line_width: f32,
    /// The probed (or degraded) font metrics.
    pub font_metrics: FontMetrics,
}

/// Policies controlling where the wrap algorithm may break inside a
/// token. Inject a custom policy through
/// [`TextMeasurer::with_policy`]; the defaults break any token when
/// `break_words` is set, between any pair of characters, split
/// per-`char`.
#[derive(Copy, Clone)]
pub struct WrapPolicy {
    /// Whether an over-budget token may be broken at all.
    pub can_break_words: fn(token: &str, break_words: bool) -> bool,
    /// Whether a line break may fall between two characters of a
    /// token. Receives the characters, the token, the split index, and
    /// the style's `break_words` flag.
    pub can_break_chars: fn(c: char, next: char, token: &str, index: usize, break_words: bool) -> bool,
    /// Splits a token into its smallest breakable units. Swap in a
    /// grapheme-cluster splitter to keep combined emoji intact.
    pub split: fn(token: &str) -> Vec<String>,
}

impl Default for WrapPolicy {
    fn default() -> Self {
        Self {
            can_break_words: |_, break_words| break_words,
            can_break_chars: |_, _, _, _, _| true,
            split: |token| token.chars().map(String::from).collect(),
        }
    }
}

/// Measures and word-wraps text: owns the font metrics cache and the
/// wrap policy.
#[derive(Default)]
pub struct TextMeasurer {
    pub fonts: FontMetricsCache,
    policy: WrapPolicy,
}

impl TextMeasurer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: WrapPolicy) -> Self {
        Self {
            fonts: FontMetricsCache::new(),
            policy,
        }
    }

    /// Measures `text` under `style`, wrapping to
    /// `style.word_wrap_width()` when word wrap applies.
    ///
    /// `word_wrap` overrides `style.word_wrap()` when `Some`.
    pub fn measure<S: Surface>(
        &mut self,
        text: &str,
        style: &TextStyle,
        word_wrap: Option<bool>,
        surface: &mut S,
    ) -> Result<TextMetrics, SurfaceError> {
        surface.ready()?;

        let word_wrap = word_wrap.unwrap_or_else(|| style.word_wrap());
        let font = style.to_font_string();

        let mut font_metrics = self.fonts.measure(surface, &font);
        if font_metrics.font_size == 0. {
            // readback-restricted surface: approximate from the
            // declared size; descent stays zero on this path
            font_metrics.font_size = style.font_size().px();
            font_metrics.ascent = font_metrics.font_size;
        }

        surface.set_font(&font);

        let output = if word_wrap {
            self.word_wrap(text, style, surface)
        } else {
            text.to_owned()
        };
        let lines = split_lines(&output);

        let mut line_widths = Vec::with_capacity(lines.len());
        let mut max_line_width = 0f32;
        for line in &lines {
            let line_width = surface.measure(line)
                + (line.chars().count() as f32 - 1.) * style.letter_spacing();
            line_widths.push(line_width);
            max_line_width = max_line_width.max(line_width);
        }

        let mut width = max_line_width + style.stroke_thickness();
        if style.drop_shadow() {
            width += style.drop_shadow_distance();
        }

        let line_height = if style.line_height() != 0. {
            style.line_height()
        } else {
            font_metrics.font_size + style.stroke_thickness()
        };
        let mut height = line_height.max(font_metrics.font_size + style.stroke_thickness())
            + (lines.len() as f32 - 1.) * (line_height + style.leading());
        if style.drop_shadow() {
            height += style.drop_shadow_distance();
        }

        Ok(TextMetrics {
            text: text.to_owned(),
            style: style.clone(),
            width,
            height,
            lines,
            line_widths,
            line_height: line_height + style.leading(),
            max_line_width,
            font_metrics,
        })
    }

    /// Greedy word-wrap over the token stream. Returns the text with
    /// line breaks inserted.
    fn word_wrap<S: Surface>(&mut self, text: &str, style: &TextStyle, surface: &mut S) -> String {
        let letter_spacing = style.letter_spacing();
        let collapse_spaces = collapse_spaces(style.white_space());
        let collapse_newlines = collapse_newlines(style.white_space());
        // whether spaces may survive at the beginning of a line
        let mut can_prepend_spaces = !collapse_spaces;

        // every character carries a trailing letter-spacing gap in the
        // cached widths, so the budget gets one extra gap too; the
        // final gap of each line is simply never drawn
        let budget = style.word_wrap_width() + letter_spacing;

        let mut width = 0f32;
        let mut line = String::new();
        let mut lines = String::new();
        let mut cache: AHashMap<String, f32> = AHashMap::new();

        let tokens = tokenize(text);
        for (i, raw_token) in tokens.iter().enumerate() {
            let mut token = raw_token.as_str();

            if is_newline_token(token) {
                if !collapse_newlines {
                    push_line(&mut lines, &line, true);
                    can_prepend_spaces = !collapse_spaces;
                    line.clear();
                    width = 0.;
                    continue;
                }
                // collapsed newlines degrade to a plain space
                token = " ";
            }

            if collapse_spaces {
                let curr_is_space = is_space_token(token);
                let last_is_space = line.chars().last().map_or(false, is_breaking_space);
                if curr_is_space && last_is_space {
                    continue;
                }
            }

            let token_width = cached_width(token, letter_spacing, &mut cache, surface);

            if token_width > budget {
                // the token alone overflows the line
                if !line.is_empty() {
                    push_line(&mut lines, &line, true);
                    line.clear();
                    width = 0.;
                }

                if (self.policy.can_break_words)(token, style.break_words()) {
                    let pieces = (self.policy.split)(token);
                    let mut j = 0;
                    while j < pieces.len() {
                        let mut chunk = pieces[j].clone();
                        let mut consumed = 1;
                        while j + consumed < pieces.len() {
                            let next_piece = &pieces[j + consumed];
                            let last = chunk.chars().last().unwrap_or(' ');
                            let next = next_piece.chars().next().unwrap_or(' ');
                            if (self.policy.can_break_chars)(
                                last,
                                next,
                                token,
                                j,
                                style.break_words(),
                            ) {
                                break;
                            }
                            chunk.push_str(next_piece);
                            consumed += 1;
                        }
                        j += consumed;

                        let chunk_width =
                            cached_width(&chunk, letter_spacing, &mut cache, surface);
                        if chunk_width + width > budget {
                            push_line(&mut lines, &line, true);
                            can_prepend_spaces = false;
                            line.clear();
                            width = 0.;
                        }
                        line.push_str(&chunk);
                        width += chunk_width;
                    }
                } else {
                    // unbreakable: the token runs out of bounds on its
                    // own line
                    let is_last_token = i == tokens.len() - 1;
                    push_line(&mut lines, token, !is_last_token);
                    can_prepend_spaces = false;
                    line.clear();
                    width = 0.;
                }
            } else {
                if token_width + width > budget {
                    // the token fits a line but not this one
                    can_prepend_spaces = false;
                    push_line(&mut lines, &line, true);
                    line.clear();
                    width = 0.;
                }

                // drop suppressible spaces at the start of a line
                if !line.is_empty() || !is_space_token(token) || can_prepend_spaces {
                    line.push_str(token);
                    width += token_width;
                }
            }
        }
        push_line(&mut lines, &line, false);

        lines
    }
}

/// Newline characters recognized by the tokenizer.
const NEWLINES: &[char] = &['\u{000A}', '\u{000D}'];

/// Whitespace characters eligible for line-break insertion.
const BREAKING_SPACES: &[char] = &[
    '\u{0009}', // tab
    '\u{0020}', // space
    '\u{2000}', '\u{2001}', '\u{2002}', '\u{2003}', '\u{2004}', '\u{2005}',
    '\u{2006}', '\u{2008}', '\u{2009}', '\u{200A}', // en/em/figure-family spaces (not U+2007)
    '\u{205F}', // medium mathematical space
    '\u{3000}', // ideographic space
];

pub fn is_breaking_space(c: char) -> bool {
    BREAKING_SPACES.contains(&c)
}

pub fn is_newline(c: char) -> bool {
    NEWLINES.contains(&c)
}

fn is_space_token(token: &str) -> bool {
    token.chars().next().map_or(false, is_breaking_space)
}

fn is_newline_token(token: &str) -> bool {
    token.chars().next().map_or(false, is_newline)
}

/// Splits text into maximal runs of plain characters interleaved with
/// single-character tokens for each breaking space or newline.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut token = String::new();
    for c in text.chars() {
        if is_breaking_space(c) || is_newline(c) {
            if !token.is_empty() {
                tokens.push(std::mem::take(&mut token));
            }
            tokens.push(c.to_string());
            continue;
        }
        token.push(c);
    }
    if !token.is_empty() {
        tokens.push(token);
    }
    tokens
}

/// Appends a line to the wrap output, trailing breaking spaces
/// trimmed.
fn push_line(lines: &mut String, line: &str, newline: bool) {
    lines.push_str(trim_right(line));
    if newline {
        lines.push('\n');
    }
}

fn trim_right(line: &str) -> &str {
    line.trim_end_matches(is_breaking_space)
}

/// Token width including one trailing letter-spacing gap per
/// character, memoized on the raw token text.
fn cached_width<S: Surface>(
    token: &str,
    letter_spacing: f32,
    cache: &mut AHashMap<String, f32>,
    surface: &mut S,
) -> f32 {
    if let Some(&width) = cache.get(token) {
        return width;
    }
    let width = surface.measure(token) + token.chars().count() as f32 * letter_spacing;
    cache.insert(token.to_owned(), width);
    width
}

fn collapse_spaces(white_space: WhiteSpace) -> bool {
    matches!(white_space, WhiteSpace::Normal | WhiteSpace::PreLine)
}

fn collapse_newlines(white_space: WhiteSpace) -> bool {
    white_space == WhiteSpace::Normal
}

/// Splits on `\r\n`, `\r`, or `\n`.
fn split_lines(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .split('\n')
        .map(str::to_owned)
        .collect()
}
