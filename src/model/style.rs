//! Display attributes attached to text segments.
//!
//! Line-level attributes (margins, wrap mode, justification, tabs, spacing)
//! are taken from the style in effect at the start of a display line;
//! character-level attributes (font, offset, elision) apply per segment.

use bitflags::bitflags;
use serde::Deserialize;
use std::rc::Rc;
use std::str::FromStr;

/// Opaque font handle understood by a [`crate::model::font::FontMetrics`].
pub type FontId = u16;

/// Shared, immutable style.
pub type StyleRef = Rc<Style>;

/// How over-long lines are broken into display lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMode {
    /// Never wrap; long lines extend past the right edge.
    None,
    /// Wrap at any character boundary.
    Char,
    /// Wrap after whitespace.
    #[default]
    Word,
    /// Wrap at Unicode line-break opportunities.
    Codepoint,
}

impl FromStr for WrapMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "char" => Ok(Self::Char),
            "word" => Ok(Self::Word),
            "codepoint" => Ok(Self::Codepoint),
            other => Err(format!(
                "unknown wrap mode {other:?} (expected none, char, word or codepoint)"
            )),
        }
    }
}

/// Horizontal placement of display-line content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Justify {
    /// Flush with the left margin.
    #[default]
    Left,
    /// Flush with the right margin.
    Right,
    /// Centered between the margins.
    Center,
    /// Inter-word space stretched to fill the line; the last display line of
    /// a logical line stays left-aligned.
    Full,
}

/// Alignment of the text following a tab relative to its tab stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabAlign {
    /// Text starts at the stop.
    #[default]
    Left,
    /// Text ends at the stop.
    Right,
    /// Text is centered on the stop.
    Center,
    /// The decimal point sits on the stop.
    Numeric,
}

/// A tab stop, in pixels from the left edge of the text area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct TabStop {
    /// Pixel position.
    pub position: i32,
    /// Alignment of the text after the tab.
    #[serde(default)]
    pub align: TabAlign,
}

impl TabStop {
    /// Left-aligned stop at `position`.
    pub fn left(position: i32) -> Self {
        Self {
            position,
            align: TabAlign::Left,
        }
    }
}

/// How tabs map to stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStyle {
    /// The n-th tab of a line uses the n-th stop.
    #[default]
    Tabular,
    /// Each tab advances to the next stop to the right of the current position.
    #[serde(alias = "word-processor")]
    WordProcessor,
}

impl FromStr for TabStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tabular" => Ok(Self::Tabular),
            "wordprocessor" | "word-processor" => Ok(Self::WordProcessor),
            other => Err(format!("unknown tab style {other:?}")),
        }
    }
}

bitflags! {
    /// Spelling-change rules enabled for soft hyphens.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HyphenRules: u8 {
        /// `kong-fu` breaks as `kong-` / `-fu`.
        const REPEAT_HYPHEN = 1 << 0;
        /// Dutch `omaatje` breaks as `oma-` / `tje`.
        const DOUBLE_VOWEL = 1 << 1;
        /// German `Zucker` breaks as `Zuk-` / `ker`.
        const CK = 1 << 2;
        /// Hungarian `asszony` breaks as `asz-` / `szony`.
        const DOUBLE_DIGRAPH = 1 << 3;
        /// Dutch `reëel` breaks as `re-` / `eel`.
        const TREMA = 1 << 4;
        /// Catalan `col·lecció` breaks as `col-` / `lecció`.
        const GEMINATION = 1 << 5;
        /// German `Schiffahrt` breaks as `Schiff-` / `fahrt`.
        const TRIPLE_CONSONANT = 1 << 6;
    }
}

impl HyphenRules {
    /// Parses a comma- or space-separated list of rule names.
    pub fn parse_list(list: &str) -> Result<Self, String> {
        let mut rules = Self::empty();
        for name in list
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
        {
            rules |= match name.to_ascii_lowercase().as_str() {
                "repeathyphen" => Self::REPEAT_HYPHEN,
                "doublevowel" => Self::DOUBLE_VOWEL,
                "ck" => Self::CK,
                "doubledigraph" => Self::DOUBLE_DIGRAPH,
                "trema" => Self::TREMA,
                "gemination" => Self::GEMINATION,
                "tripleconsonant" => Self::TRIPLE_CONSONANT,
                other => return Err(format!("unknown hyphen rule {other:?}")),
            };
        }
        Ok(rules)
    }
}

/// Display attributes of a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    /// Font used for text in this style.
    pub font: FontId,
    /// Left margin of the first display line of a logical line.
    pub lmargin1: i32,
    /// Left margin of continuation display lines.
    pub lmargin2: i32,
    /// Right margin.
    pub rmargin: i32,
    /// Extra space above the first display line of a logical line.
    pub spacing1: i32,
    /// Extra space between display lines of one logical line.
    pub spacing2: i32,
    /// Extra space below the last display line of a logical line.
    pub spacing3: i32,
    /// Baseline offset; positive raises the text.
    pub offset: i32,
    /// Hidden text occupies no space.
    pub elide: bool,
    /// Horizontal placement.
    pub justify: Justify,
    /// Wrapping behavior.
    pub wrap: WrapMode,
    /// Tab stops sorted by position; empty means default stops.
    pub tabs: Vec<TabStop>,
    /// Tab interpretation.
    pub tab_style: TabStyle,
    /// Language tag used for line-break tailoring.
    pub lang: Option<String>,
    /// Whether soft hyphens are break opportunities.
    pub hyphenate: bool,
    /// Spelling changes allowed at soft hyphens. The rules belong to
    /// particular languages, so none are enabled by default.
    pub hyphen_rules: HyphenRules,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            font: 0,
            lmargin1: 0,
            lmargin2: 0,
            rmargin: 0,
            spacing1: 0,
            spacing2: 0,
            spacing3: 0,
            offset: 0,
            elide: false,
            justify: Justify::Left,
            wrap: WrapMode::Word,
            tabs: Vec::new(),
            tab_style: TabStyle::Tabular,
            lang: None,
            hyphenate: true,
            hyphen_rules: HyphenRules::empty(),
        }
    }
}

impl Style {
    /// Wraps the style for sharing between segments.
    pub fn shared(self) -> StyleRef {
        Rc::new(self)
    }
}
