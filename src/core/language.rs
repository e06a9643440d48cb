//! Languages, directions, and the text predicates used for arbitration.
//!
//! Two directions run concurrently over the same audio input. Each direction
//! has a fixed source language, and the arbiter uses a script-based language
//! guess to tell which direction a recognition result actually belongs to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Characters stripped before deciding whether a text carries any content.
const FILLER_CHARS: &[char] = &[
    '。', '，', '、', '！', '？', '；', '：', '“', '”', '‘', '’', '（', '）', '《', '》', '…', '—',
    '·', '～', '.', ',', '!', '?', ';', ':', '\'', '"', '(', ')', '[', ']', '{', '}', '<', '>',
    '-', '_', '~', '`', '*', '/', '\\',
];

/// Writing system used to recognise a language in text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    /// Hiragana and katakana
    Kana,
    /// Hangul syllables and jamo
    Hangul,
    /// CJK unified ideographs
    Han,
    /// Latin letters
    Latin,
}

impl Script {
    /// Lower rank wins when two scripts are both present in a text.
    ///
    /// Japanese text routinely contains Han characters, so kana is checked first.
    fn rank(self) -> u8 {
        match self {
            Script::Kana => 0,
            Script::Hangul => 1,
            Script::Han => 2,
            Script::Latin => 3,
        }
    }

    /// Whether `c` belongs to this script.
    pub fn contains(self, c: char) -> bool {
        match self {
            Script::Kana => matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}'),
            Script::Hangul => matches!(c, '\u{AC00}'..='\u{D7AF}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}'),
            Script::Han => matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}'),
            Script::Latin => c.is_ascii_alphabetic() || matches!(c, '\u{00C0}'..='\u{024F}'),
        }
    }

    fn present_in(self, text: &str) -> bool {
        text.chars().any(|c| self.contains(c))
    }
}

/// Languages the relay can arbitrate between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "de")]
    German,
}

impl Language {
    /// Parse an engine language code (`zh`, `en-US`, ...). Region suffixes are ignored.
    pub fn from_code(code: &str) -> Result<Self, LanguageError> {
        let primary = code
            .split(['-', '_'])
            .next()
            .unwrap_or(code)
            .to_ascii_lowercase();
        match primary.as_str() {
            "zh" => Ok(Language::Chinese),
            "en" => Ok(Language::English),
            "ja" => Ok(Language::Japanese),
            "ko" => Ok(Language::Korean),
            "es" => Ok(Language::Spanish),
            "fr" => Ok(Language::French),
            "de" => Ok(Language::German),
            _ => Err(LanguageError::Unsupported(code.to_string())),
        }
    }

    /// Engine language code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Chinese => "zh",
            Language::English => "en",
            Language::Japanese => "ja",
            Language::Korean => "ko",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
        }
    }

    pub fn script(&self) -> Script {
        match self {
            Language::Chinese => Script::Han,
            Language::Japanese => Script::Kana,
            Language::Korean => Script::Hangul,
            Language::English | Language::Spanish | Language::French | Language::German => {
                Script::Latin
            }
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors raised while resolving a language pair
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LanguageError {
    #[error("Unsupported language: {0}")]
    Unsupported(String),
    #[error("Languages {0} and {1} share a script and cannot be told apart")]
    Indistinguishable(Language, Language),
}

/// One of the two fixed directions of a dual session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Primary language into secondary language
    Forward,
    /// Secondary language into primary language
    Reverse,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Forward, Direction::Reverse];

    pub fn other(self) -> Direction {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }

    /// Stable index for per-direction arrays.
    pub fn index(self) -> usize {
        match self {
            Direction::Forward => 0,
            Direction::Reverse => 1,
        }
    }
}

/// The two languages of a session and the directions built from them.
///
/// `Direction::Forward` translates `primary → secondary`,
/// `Direction::Reverse` translates `secondary → primary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionPair {
    primary: Language,
    secondary: Language,
}

impl DirectionPair {
    /// Build a pair, rejecting languages that script detection cannot separate.
    pub fn new(primary: Language, secondary: Language) -> Result<Self, LanguageError> {
        if primary.script() == secondary.script() {
            return Err(LanguageError::Indistinguishable(primary, secondary));
        }
        Ok(Self { primary, secondary })
    }

    pub fn from_codes(primary: &str, secondary: &str) -> Result<Self, LanguageError> {
        Self::new(Language::from_code(primary)?, Language::from_code(secondary)?)
    }

    pub fn primary(&self) -> Language {
        self.primary
    }

    pub fn secondary(&self) -> Language {
        self.secondary
    }

    pub fn source(&self, direction: Direction) -> Language {
        match direction {
            Direction::Forward => self.primary,
            Direction::Reverse => self.secondary,
        }
    }

    pub fn target(&self, direction: Direction) -> Language {
        self.source(direction.other())
    }

    /// `(source, target)` languages of a direction.
    pub fn languages(&self, direction: Direction) -> (Language, Language) {
        (self.source(direction), self.target(direction))
    }

    /// Human readable label such as `zh→en`.
    pub fn label(&self, direction: Direction) -> String {
        let (source, target) = self.languages(direction);
        format!("{source}→{target}")
    }

    /// Classify text as one of the pair's two languages.
    ///
    /// Total over the pair: the more specific script is checked first, a
    /// Latin-script language is the fallback when no distinctive characters
    /// are present, and the primary language is the last resort.
    pub fn detect_language(&self, text: &str) -> Language {
        let (first, second) = if self.primary.script().rank() <= self.secondary.script().rank() {
            (self.primary, self.secondary)
        } else {
            (self.secondary, self.primary)
        };

        if first.script().present_in(text) {
            return first;
        }
        match second.script() {
            Script::Latin => second,
            script if script.present_in(text) => second,
            _ => self.primary,
        }
    }

    /// Direction whose source language matches the detected language of `text`.
    pub fn expected_direction(&self, text: &str) -> Direction {
        if self.detect_language(text) == self.primary {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }
}

/// Whether `text` contains anything besides whitespace and punctuation.
pub fn meaningful(text: &str) -> bool {
    text.chars()
        .any(|c| !c.is_whitespace() && !FILLER_CHARS.contains(&c))
}
