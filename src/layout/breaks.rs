//! Line-break opportunities for codepoint wrapping.
//!
//! Opportunities come from the Unicode line breaking algorithm (UAX #14) via
//! `unicode-linebreak`, with a small language tailoring: Chinese and Japanese
//! text uses the loose rule that lets a line start with a small kana or the
//! prolonged sound mark.

use unicode_linebreak::{linebreaks, BreakOpportunity};

/// Break class at a byte offset: may a line end right before this byte?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakClass {
    /// No break here.
    #[default]
    NoBreak,
    /// A break is allowed here.
    Allowed,
    /// A break is required here.
    Mandatory,
}

/// Computes break classes for `text`, indexed by byte offset `0..=len`.
///
/// Entry `i` describes a break between byte `i - 1` and byte `i`; offsets
/// inside a UTF-8 sequence are always [`BreakClass::NoBreak`].
///
/// # Examples
///
/// ```
/// # use textdisp::layout::breaks::{compute_break_opportunities, BreakClass};
/// let breaks = compute_break_opportunities("ab cd\n", None);
/// assert_eq!(breaks[3], BreakClass::Allowed);
/// assert_eq!(breaks[6], BreakClass::Mandatory);
/// assert_eq!(breaks[1], BreakClass::NoBreak);
/// ```
pub fn compute_break_opportunities(text: &str, lang: Option<&str>) -> Box<[BreakClass]> {
    let mut classes = vec![BreakClass::NoBreak; text.len() + 1];
    for (pos, opportunity) in linebreaks(text) {
        classes[pos] = match opportunity {
            BreakOpportunity::Mandatory => BreakClass::Mandatory,
            BreakOpportunity::Allowed => BreakClass::Allowed,
        };
    }

    if lang.is_some_and(uses_loose_kana_rule) {
        for (pos, c) in text.char_indices() {
            if pos > 0 && is_conditional_japanese_starter(c) && classes[pos] == BreakClass::NoBreak {
                classes[pos] = BreakClass::Allowed;
            }
        }
    }

    classes.into_boxed_slice()
}

fn uses_loose_kana_rule(lang: &str) -> bool {
    let primary = lang.split(['-', '_']).next().unwrap_or(lang);
    primary.eq_ignore_ascii_case("ja") || primary.eq_ignore_ascii_case("zh")
}

/// Small kana and the prolonged sound mark (line break class CJ).
fn is_conditional_japanese_starter(c: char) -> bool {
    matches!(
        c,
        'ぁ' | 'ぃ' | 'ぅ' | 'ぇ' | 'ぉ' | 'っ' | 'ゃ' | 'ゅ' | 'ょ' | 'ゎ' | 'ゕ' | 'ゖ'
            | 'ァ' | 'ィ' | 'ゥ' | 'ェ' | 'ォ' | 'ッ' | 'ャ' | 'ュ' | 'ョ' | 'ヮ' | 'ヵ' | 'ヶ'
            | 'ー'
            | '\u{31F0}'..='\u{31FF}'
            | '\u{FF67}'..='\u{FF70}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed_offsets(text: &str, lang: Option<&str>) -> Vec<usize> {
        compute_break_opportunities(text, lang)
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != BreakClass::NoBreak)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn breaks_after_spaces() {
        assert_eq!(allowed_offsets("one two three\n", None), vec![4, 8, 14]);
    }

    #[test]
    fn length_covers_end_of_text() {
        let breaks = compute_break_opportunities("abc\n", None);
        assert_eq!(breaks.len(), 5);
    }

    #[test]
    fn no_break_inside_multibyte_characters() {
        let text = "日本語\n";
        let breaks = compute_break_opportunities(text, None);
        for (i, class) in breaks.iter().enumerate() {
            if !text.is_char_boundary(i) {
                assert_eq!(*class, BreakClass::NoBreak, "offset {i}");
            }
        }
    }

    #[test]
    fn japanese_tailoring_allows_break_before_small_kana() {
        let text = "キャット\n";
        let small_ya = "キ".len();
        let default = compute_break_opportunities(text, None);
        let tailored = compute_break_opportunities(text, Some("ja-JP"));
        assert_eq!(default[small_ya], BreakClass::NoBreak);
        assert_eq!(tailored[small_ya], BreakClass::Allowed);
    }
}
