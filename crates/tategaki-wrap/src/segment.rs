//! Phrase segmentation.
//!
//! A [`Segmenter`] splits one line (no newlines) into phrases, the atomic
//! units the wrapper packs into columns. Implementations must be lossless:
//! concatenating the returned phrases reproduces the input exactly.
//!
//! [`PhraseSegmenter`] is a dictionary-free default driven by character
//! classes. Japanese phrases (bunsetsu) usually open with a content word in
//! kanji or katakana and close with hiragana particles or okurigana, so a
//! hiragana-to-content transition is the main boundary signal.

/// Splits a line into phrases.
pub trait Segmenter: Send + Sync {
    /// Split `line` into phrases whose concatenation equals `line`.
    fn segment<'a>(&self, line: &'a str) -> Vec<&'a str>;
}

/// Coarse character class used for phrase boundary detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Hiragana,
    /// Full and half-width katakana, including the prolonged sound mark.
    Katakana,
    Kanji,
    /// ASCII and full-width letters and digits.
    Alphanumeric,
    /// Opening brackets and quotes; they attach to the following text.
    Opening,
    /// Closing brackets and sentence punctuation; they attach to the preceding text.
    Closing,
    Space,
    Other,
}

impl CharClass {
    pub fn of(c: char) -> Self {
        match c {
            '「' | '『' | '（' | '(' | '［' | '[' | '｛' | '{' | '〈' | '《' | '【' | '〔' | '“'
            | '‘' | '〝' => CharClass::Opening,
            '、' | '。' | '，' | '．' | ',' | '.' | '！' | '？' | '!' | '?' | '」' | '』' | '）'
            | ')' | '］' | ']' | '｝' | '}' | '〉' | '》' | '】' | '〕' | '”' | '’' | '〟'
            | '：' | '；' | ':' | ';' | '…' | '‥' | '｡' | '､' | '｣' => CharClass::Closing,
            '\u{3041}'..='\u{309F}' => CharClass::Hiragana,
            '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' | '\u{FF66}'..='\u{FF9F}' => {
                CharClass::Katakana
            }
            '\u{3005}'
            | '\u{3006}'
            | '\u{3007}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2FA1F}' => CharClass::Kanji,
            '\u{FF10}'..='\u{FF19}' | '\u{FF21}'..='\u{FF3A}' | '\u{FF41}'..='\u{FF5A}' => {
                CharClass::Alphanumeric
            }
            c if c.is_ascii_alphanumeric() => CharClass::Alphanumeric,
            c if c.is_whitespace() => CharClass::Space,
            _ => CharClass::Other,
        }
    }
}

/// Character-class driven phrase segmenter for Japanese text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhraseSegmenter;

impl PhraseSegmenter {
    /// Whether a phrase boundary falls between two adjacent characters.
    fn is_boundary(prev: CharClass, next: CharClass) -> bool {
        use CharClass::*;

        match (prev, next) {
            (Closing, Closing) => false,
            (Closing, _) => true,
            (Opening, _) => false,
            (_, Opening) => true,
            (_, Closing) | (_, Space) => false,
            (Space, _) => true,
            (Hiragana, Kanji | Katakana | Alphanumeric | Other) => true,
            (Alphanumeric, Alphanumeric) => false,
            (Alphanumeric, _) | (_, Alphanumeric) => true,
            _ => false,
        }
    }
}

impl Segmenter for PhraseSegmenter {
    fn segment<'a>(&self, line: &'a str) -> Vec<&'a str> {
        let mut phrases = Vec::new();
        let mut start = 0;
        let mut prev: Option<CharClass> = None;

        for (idx, c) in line.char_indices() {
            let class = CharClass::of(c);
            if let Some(prev) = prev {
                if Self::is_boundary(prev, class) {
                    phrases.push(&line[start..idx]);
                    start = idx;
                }
            }
            prev = Some(class);
        }

        if start < line.len() {
            phrases.push(&line[start..]);
        }
        phrases
    }
}
