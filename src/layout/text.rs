use crate::config::TextConfig;

/// Estimated rendered line count when labels wrap every
/// `words_per_line` words. Empty text occupies no lines.
pub(crate) fn text_lines(text: &str, config: &TextConfig) -> usize {
    let words = text.split_whitespace().count();
    words.div_ceil(config.words_per_line.max(1))
}

pub(crate) fn estimate_text_width(text: &str, font_size: f32, config: &TextConfig) -> f32 {
    text.chars().count() as f32 * font_size * config.glyph_width_ratio
}
