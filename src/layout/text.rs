//! Line breaking for text runs.
//!
//! Greedy fill against a maximum width, breaking only at UAX#14 opportunities
//! and falling back to a hard break inside a word that is wider than the line.

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::font::StandardFont;

/// One laid-out line.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    pub text: String,
    /// Width without trailing whitespace.
    pub width: f64,
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Break opportunities indexed by char position: entry `i` is the
/// opportunity *before* `chars[i]`. Index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = char_count;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }
    result
}

fn make_line(chars: &[char], widths: &[f64]) -> BrokenLine {
    let mut end = chars.len();
    while end > 0 && (chars[end - 1].is_whitespace()) {
        end -= 1;
    }
    let text: String = chars[..end].iter().filter(|c| !is_newline(**c)).collect();
    let width = chars[..end]
        .iter()
        .zip(&widths[..end])
        .filter(|(c, _)| !is_newline(**c))
        .map(|(_, w)| w)
        .sum();
    BrokenLine { text, width }
}

/// Break `text` into lines no wider than `max_width`.
///
/// An empty string yields no lines.
pub fn break_into_lines(
    text: &str,
    max_width: f64,
    font: StandardFont,
    font_size: f64,
) -> Vec<BrokenLine> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    let widths: Vec<f64> = chars.iter().map(|&c| font.char_width(c, font_size)).collect();
    let opportunities = compute_break_opportunities(text);

    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut line_width = 0.0;
    let mut last_break: Option<usize> = None;

    for (i, &ch) in chars.iter().enumerate() {
        if i > 0 {
            match opportunities[i] {
                Some(BreakOpportunity::Mandatory) => {
                    lines.push(make_line(&chars[line_start..i], &widths[line_start..i]));
                    line_start = i;
                    line_width = 0.0;
                    last_break = None;
                }
                Some(BreakOpportunity::Allowed) => last_break = Some(i - 1),
                None => {}
            }
        }

        if is_newline(ch) {
            continue;
        }
        let width = widths[i];

        // Spaces may hang past the edge; they are trimmed from the line.
        if ch.is_whitespace() {
            line_width += width;
            continue;
        }

        if line_width + width > max_width && line_start < i {
            if let Some(bp) = last_break.filter(|bp| *bp >= line_start) {
                lines.push(make_line(&chars[line_start..=bp], &widths[line_start..=bp]));
                line_start = bp + 1;
                line_width = chars[line_start..=i]
                    .iter()
                    .zip(&widths[line_start..=i])
                    .filter(|(c, _)| !is_newline(**c))
                    .map(|(_, w)| w)
                    .sum();
                last_break = None;
                continue;
            }

            // No opportunity on this line: break inside the word.
            lines.push(make_line(&chars[line_start..i], &widths[line_start..i]));
            line_start = i;
            line_width = width;
            last_break = None;
            continue;
        }

        line_width += width;
    }

    if line_start < chars.len() {
        lines.push(make_line(&chars[line_start..], &widths[line_start..]));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[BrokenLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_single_line() {
        let lines = break_into_lines("Hello World", 1000.0, StandardFont::Helvetica, 12.0);
        assert_eq!(texts(&lines), vec!["Hello World"]);
        let expected = StandardFont::Helvetica.measure_string("Hello World", 12.0);
        assert!((lines[0].width - expected).abs() < 1e-9);
    }

    #[test]
    fn test_break_at_space() {
        let width = StandardFont::Helvetica.measure_string("Hello", 12.0) + 1.0;
        let lines = break_into_lines("Hello World", width, StandardFont::Helvetica, 12.0);
        assert_eq!(texts(&lines), vec!["Hello", "World"]);
    }

    #[test]
    fn test_explicit_newline() {
        let lines = break_into_lines("one\ntwo", 1000.0, StandardFont::Helvetica, 12.0);
        assert_eq!(texts(&lines), vec!["one", "two"]);
    }

    #[test]
    fn test_overlong_word_is_force_broken() {
        let lines = break_into_lines("abcdefghij", 20.0, StandardFont::Helvetica, 12.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.iter().map(|l| l.text.as_str()).collect::<String>(), "abcdefghij");
        assert!(lines.iter().all(|l| l.width <= 20.0 || l.text.chars().count() == 1));
    }

    #[test]
    fn test_empty_string() {
        assert!(break_into_lines("", 100.0, StandardFont::Helvetica, 12.0).is_empty());
    }
}
