//! Spelling changes at soft hyphens.
//!
//! Several languages change the spelling of a word when it is hyphenated.
//! When a display line ends at a soft hyphen, the first enabled rule (in
//! [`HyphenRule::PRIORITY`] order) that matches the surrounding text decides
//! what is drawn before the break, and the rule is carried to the next
//! display line, which may start with extra or substituted characters.

use crate::model::style::HyphenRules;

/// A spelling-change rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HyphenRule {
    /// An explicit hyphen before the break is repeated on the next line.
    RepeatHyphen,
    /// A doubled vowel before the break loses one vowel.
    DoubleVowel,
    /// `c` before `k` becomes `k`.
    Ck,
    /// A consonant before a matching digraph doubles the digraph.
    DoubleDigraph,
    /// A vowel with diaeresis after the break loses the diaeresis.
    Trema,
    /// The middle dot of `l·l` is dropped.
    Gemination,
    /// A double consonant before the break becomes triple.
    TripleConsonant,
}

impl HyphenRule {
    /// Order in which rules are tried.
    pub const PRIORITY: [HyphenRule; 7] = [
        HyphenRule::RepeatHyphen,
        HyphenRule::DoubleVowel,
        HyphenRule::Ck,
        HyphenRule::DoubleDigraph,
        HyphenRule::Trema,
        HyphenRule::Gemination,
        HyphenRule::TripleConsonant,
    ];

    /// The flag enabling this rule.
    pub fn flag(self) -> HyphenRules {
        match self {
            HyphenRule::RepeatHyphen => HyphenRules::REPEAT_HYPHEN,
            HyphenRule::DoubleVowel => HyphenRules::DOUBLE_VOWEL,
            HyphenRule::Ck => HyphenRules::CK,
            HyphenRule::DoubleDigraph => HyphenRules::DOUBLE_DIGRAPH,
            HyphenRule::Trema => HyphenRules::TREMA,
            HyphenRule::Gemination => HyphenRules::GEMINATION,
            HyphenRule::TripleConsonant => HyphenRules::TRIPLE_CONSONANT,
        }
    }
}

/// What a display line ending at a soft hyphen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyphenBreak {
    /// Rule applied, if any.
    pub rule: Option<HyphenRule>,
    /// Bytes at the end of the preceding text that are no longer drawn.
    pub drop_before: usize,
    /// Text drawn in place of the soft hyphen, hyphen sign included.
    pub shown: String,
}

/// What a display line following a rule-carrying break starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarryPrefix {
    /// Text drawn at the start of the line.
    pub shown: String,
    /// Source bytes the prefix stands for; zero for pure insertions.
    pub consumed: usize,
}

/// Hungarian digraphs doubled by [`HyphenRule::DoubleDigraph`].
const DIGRAPHS: [&str; 8] = ["cs", "dz", "gy", "ly", "ny", "sz", "ty", "zs"];

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

fn is_consonant(c: char) -> bool {
    c.is_alphabetic() && !is_vowel(c)
}

fn strip_trema(c: char) -> Option<char> {
    Some(match c {
        'ä' => 'a',
        'ë' => 'e',
        'ï' => 'i',
        'ö' => 'o',
        'ü' => 'u',
        'ÿ' => 'y',
        'Ä' => 'A',
        'Ë' => 'E',
        'Ï' => 'I',
        'Ö' => 'O',
        'Ü' => 'U',
        'Ÿ' => 'Y',
        _ => return None,
    })
}

fn last_two(text: &str) -> (Option<char>, Option<char>) {
    let mut rev = text.chars().rev();
    let last = rev.next();
    (rev.next(), last)
}

fn match_rule(rule: HyphenRule, before: &str, after: &str) -> Option<HyphenBreak> {
    let (prev, last) = last_two(before);
    let mut next = after.chars();
    let (first, second) = (next.next(), next.next());
    let plain = |drop_before: usize, shown: String| {
        Some(HyphenBreak {
            rule: Some(rule),
            drop_before,
            shown,
        })
    };

    match rule {
        HyphenRule::RepeatHyphen => {
            (last == Some('-')).then(|| HyphenBreak {
                rule: Some(rule),
                drop_before: 0,
                shown: String::new(),
            })
        }
        HyphenRule::DoubleVowel => match (prev, last) {
            (Some(a), Some(b)) if is_vowel(b) && a.eq_ignore_ascii_case(&b) => {
                plain(b.len_utf8(), "-".to_owned())
            }
            _ => None,
        },
        HyphenRule::Ck => match (last, first) {
            (Some('c'), Some('k' | 'K')) => plain(1, "k-".to_owned()),
            (Some('C'), Some('k' | 'K')) => plain(1, "K-".to_owned()),
            _ => None,
        },
        HyphenRule::DoubleDigraph => match (last, first, second) {
            (Some(l), Some(f), Some(s)) if l.eq_ignore_ascii_case(&f) => {
                let digraph: String = [f.to_ascii_lowercase(), s.to_ascii_lowercase()]
                    .iter()
                    .collect();
                DIGRAPHS
                    .contains(&digraph.as_str())
                    .then(|| HyphenBreak {
                        rule: Some(rule),
                        drop_before: 0,
                        shown: format!("{s}-"),
                    })
            }
            _ => None,
        },
        HyphenRule::Trema => {
            first.and_then(strip_trema)?;
            plain(0, "-".to_owned())
        }
        HyphenRule::Gemination => match (prev, last, first) {
            (Some('l' | 'L'), Some('·'), Some('l' | 'L')) => plain('·'.len_utf8(), "-".to_owned()),
            (_, Some('ŀ'), Some('l')) => plain('ŀ'.len_utf8(), "l-".to_owned()),
            (_, Some('Ŀ'), Some('L')) => plain('Ŀ'.len_utf8(), "L-".to_owned()),
            _ => None,
        },
        HyphenRule::TripleConsonant => match (prev, last, first) {
            (Some(a), Some(b), Some(f)) if a == b && is_consonant(b) && f != b => {
                plain(0, "-".to_owned())
            }
            _ => None,
        },
    }
}

/// Decides how a line ending at a soft hyphen is drawn.
///
/// `before` is the text preceding the hyphen and `after` the text following
/// it in the same logical line.
///
/// # Examples
///
/// ```
/// # use textdisp::layout::hyphen::{hyphen_break, HyphenRule};
/// # use textdisp::model::style::HyphenRules;
/// let brk = hyphen_break(HyphenRules::all(), "Zuc", "ker");
/// assert_eq!(brk.rule, Some(HyphenRule::Ck));
/// assert_eq!((brk.drop_before, brk.shown.as_str()), (1, "k-"));
/// ```
pub fn hyphen_break(enabled: HyphenRules, before: &str, after: &str) -> HyphenBreak {
    HyphenRule::PRIORITY
        .iter()
        .filter(|rule| enabled.contains(rule.flag()))
        .find_map(|&rule| match_rule(rule, before, after))
        .unwrap_or_else(|| HyphenBreak {
            rule: None,
            drop_before: 0,
            shown: "-".to_owned(),
        })
}

/// Prefix of the display line following a break that applied `rule`.
///
/// `before` and `after` are the texts around the soft hyphen, as for
/// [`hyphen_break`].
pub fn carry_prefix(rule: HyphenRule, before: &str, after: &str) -> Option<CarryPrefix> {
    match rule {
        HyphenRule::RepeatHyphen => Some(CarryPrefix {
            shown: "-".to_owned(),
            consumed: 0,
        }),
        HyphenRule::Trema => {
            let c = after.chars().next()?;
            strip_trema(c).map(|base| CarryPrefix {
                shown: base.to_string(),
                consumed: c.len_utf8(),
            })
        }
        HyphenRule::TripleConsonant => before.chars().next_back().map(|c| CarryPrefix {
            shown: c.to_string(),
            consumed: 0,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(before: &str, after: &str) -> (String, String) {
        let brk = hyphen_break(HyphenRules::all(), before, after);
        let kept = &before[..before.len() - brk.drop_before];
        let first = format!("{kept}{}", brk.shown);
        let second = match brk.rule.and_then(|r| carry_prefix(r, before, after)) {
            Some(prefix) => format!("{}{}", prefix.shown, &after[prefix.consumed..]),
            None => after.to_owned(),
        };
        (first, second)
    }

    #[test]
    fn plain_hyphen_without_rule() {
        assert_eq!(apply("extra", "ordinary"), ("extra-".into(), "ordinary".into()));
    }

    #[test]
    fn repeat_hyphen() {
        assert_eq!(apply("kong-", "fu"), ("kong-".into(), "-fu".into()));
    }

    #[test]
    fn double_vowel() {
        assert_eq!(apply("omaa", "tje"), ("oma-".into(), "tje".into()));
    }

    #[test]
    fn ck() {
        assert_eq!(apply("Zuc", "ker"), ("Zuk-".into(), "ker".into()));
    }

    #[test]
    fn double_digraph() {
        assert_eq!(apply("as", "szony"), ("asz-".into(), "szony".into()));
    }

    #[test]
    fn trema() {
        assert_eq!(apply("re", "ëel"), ("re-".into(), "eel".into()));
    }

    #[test]
    fn gemination() {
        assert_eq!(apply("col·", "lecció"), ("col-".into(), "lecció".into()));
    }

    #[test]
    fn triple_consonant() {
        assert_eq!(apply("Schiff", "ahrt"), ("Schiff-".into(), "fahrt".into()));
    }

    #[test]
    fn disabled_rule_is_skipped() {
        let brk = hyphen_break(HyphenRules::all() - HyphenRules::CK, "Zuc", "ker");
        assert_eq!(brk.rule, None);
        assert_eq!(brk.shown, "-");
    }

    #[test]
    fn priority_prefers_double_vowel_over_triple_consonant() {
        let brk = hyphen_break(HyphenRules::all(), "zee", "en");
        assert_eq!(brk.rule, Some(HyphenRule::DoubleVowel));
    }
}
