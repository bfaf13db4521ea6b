//! Built-in ASCII-art text generator.
//!
//! One bitmap alphabet rendered in several styles. Callers only see
//! `render(text, font) -> lines`; an empty or unknown font name falls back to
//! [`DEFAULT_FONT`] so a bad settings value never blanks the countdown.

mod glyphs;

use glyphs::{glyph, GLYPH_HEIGHT};

pub const DEFAULT_FONT: &str = "block";

/// Sample text used by `--preview-font`.
pub const PREVIEW_TEXT: &str = "420:69";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fill {
    Char(char),
    /// Paint each glyph with its own (uppercased) character.
    Letter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FontStyle {
    name: &'static str,
    fill: Fill,
    x_scale: usize,
    y_scale: usize,
}

const FONTS: &[FontStyle] = &[
    FontStyle {
        name: "block",
        fill: Fill::Char('█'),
        x_scale: 1,
        y_scale: 1,
    },
    FontStyle {
        name: "hash",
        fill: Fill::Char('#'),
        x_scale: 1,
        y_scale: 1,
    },
    FontStyle {
        name: "shade",
        fill: Fill::Char('▓'),
        x_scale: 1,
        y_scale: 1,
    },
    FontStyle {
        name: "dots",
        fill: Fill::Char('•'),
        x_scale: 1,
        y_scale: 1,
    },
    FontStyle {
        name: "stars",
        fill: Fill::Char('*'),
        x_scale: 1,
        y_scale: 1,
    },
    FontStyle {
        name: "letters",
        fill: Fill::Letter,
        x_scale: 1,
        y_scale: 1,
    },
    FontStyle {
        name: "wide",
        fill: Fill::Char('█'),
        x_scale: 2,
        y_scale: 1,
    },
    FontStyle {
        name: "tall",
        fill: Fill::Char('█'),
        x_scale: 1,
        y_scale: 2,
    },
];

/// Names accepted by `--set-font` and `--preview-font`.
pub fn font_names() -> Vec<&'static str> {
    FONTS.iter().map(|font| font.name).collect()
}

pub fn is_known_font(name: &str) -> bool {
    find_font(name).is_some()
}

fn find_font(name: &str) -> Option<&'static FontStyle> {
    let name = name.trim();
    FONTS.iter().find(|font| font.name.eq_ignore_ascii_case(name))
}

fn resolve_font(name: &str) -> &'static FontStyle {
    find_font(name).unwrap_or(&FONTS[0])
}

/// Render `text` as equal-width art lines. Multi-line text stacks one art
/// block per line with a blank row between blocks.
pub fn render(text: &str, font: &str) -> Vec<String> {
    let style = resolve_font(font);
    let mut out: Vec<String> = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if idx > 0 {
            out.push(String::new());
        }
        out.extend(render_line(line, style));
    }
    let width = out.iter().map(|line| line.chars().count()).max().unwrap_or(0);
    for line in &mut out {
        let pad = width - line.chars().count();
        line.extend(std::iter::repeat(' ').take(pad));
    }
    out
}

fn render_line(text: &str, style: &FontStyle) -> Vec<String> {
    let mut rows = vec![String::new(); GLYPH_HEIGHT * style.y_scale];
    for (idx, ch) in text.chars().enumerate() {
        let bitmap = glyph(ch);
        let paint = match style.fill {
            Fill::Char(fill) => fill,
            Fill::Letter => ch.to_ascii_uppercase(),
        };
        for (row_idx, row) in rows.iter_mut().enumerate() {
            if idx > 0 {
                row.extend(std::iter::repeat(' ').take(style.x_scale));
            }
            let source = bitmap[row_idx / style.y_scale];
            for cell in source.chars() {
                let out = if cell == '#' { paint } else { ' ' };
                row.extend(std::iter::repeat(out).take(style.x_scale));
            }
        }
    }
    rows
}
