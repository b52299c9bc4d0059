//! Utterance text and the matching helpers every rule is built from
//!
//! Matching is done on a lowercase copy of the recognized text, but anything
//! that ends up being typed, saved or created (file names, typed text, folder
//! names) is sliced out of the original text so casing and punctuation survive.
//!
//! All phrase tests are word-boundary aware: "date" does not match "update",
//! "search" does not match "research", "no" does not match "notepad".

/// One unit of recognized speech, immutable for the duration of a turn
#[derive(Debug, Clone)]
pub struct Utterance {
    raw: String,
    lower: String,
    /// Byte offset into `raw` for every byte of `lower` (plus one past the end)
    offsets: Vec<usize>,
}

impl Utterance {
    pub fn new(text: &str) -> Self {
        let raw = text.trim().to_string();
        let mut lower = String::with_capacity(raw.len());
        let mut offsets = Vec::with_capacity(raw.len() + 1);

        for (idx, ch) in raw.char_indices() {
            for lc in ch.to_lowercase() {
                lower.push(lc);
                for _ in 0..lc.len_utf8() {
                    offsets.push(idx);
                }
            }
        }
        offsets.push(raw.len());

        Self {
            raw,
            lower,
            offsets,
        }
    }

    /// Original text, trimmed
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Lowercase form used for matching
    pub fn lower(&self) -> &str {
        &self.lower
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.raw.split_whitespace().count()
    }

    /// True if `phrase` occurs at word boundaries
    pub fn has(&self, phrase: &str) -> bool {
        find_phrase(&self.lower, phrase).is_some()
    }

    /// True if any of `phrases` occurs at word boundaries
    pub fn has_any(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|p| self.has(p))
    }

    /// First of `phrases` (in list order) that occurs in the utterance
    pub fn first_of<'p>(&self, phrases: &[&'p str]) -> Option<&'p str> {
        phrases.iter().copied().find(|p| self.has(p))
    }

    /// Original-case text following the first occurrence of `phrase`
    pub fn raw_after(&self, phrase: &str) -> Option<&str> {
        let start = find_phrase(&self.lower, phrase)?;
        Some(self.raw_from(start + phrase.len()).trim())
    }

    /// Original-case text following the last occurrence of `phrase`
    pub fn raw_after_last(&self, phrase: &str) -> Option<&str> {
        let start = rfind_phrase(&self.lower, phrase)?;
        Some(self.raw_from(start + phrase.len()).trim())
    }

    /// Original-case text preceding the first occurrence of `phrase`
    pub fn raw_before(&self, phrase: &str) -> Option<&str> {
        let start = find_phrase(&self.lower, phrase)?;
        Some(self.raw[..self.raw_index(start)].trim())
    }

    /// Lowercase text following the first occurrence of `phrase`
    pub fn lower_after(&self, phrase: &str) -> Option<&str> {
        let start = find_phrase(&self.lower, phrase)?;
        Some(self.lower[start + phrase.len()..].trim())
    }

    /// Original-case text with every word-boundary occurrence of `phrases` removed
    ///
    /// Matches are found on the lowercase form and mapped back through the
    /// offsets table, so scripts whose lowercase changes byte length are safe.
    pub fn without_phrases(&self, phrases: &[&str]) -> String {
        let mut cut: Vec<(usize, usize)> = Vec::new();
        for phrase in phrases.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            for (idx, _) in self.lower.match_indices(phrase) {
                if at_boundary(&self.lower, idx, phrase.len()) {
                    cut.push((self.raw_index(idx), self.raw_index(idx + phrase.len())));
                }
            }
        }
        cut.sort_unstable();

        let mut out = String::with_capacity(self.raw.len());
        let mut pos = 0;
        for (start, end) in cut {
            if start >= pos {
                out.push_str(&self.raw[pos..start]);
                out.push(' ');
            }
            pos = pos.max(end);
        }
        out.push_str(&self.raw[pos..]);
        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn raw_index(&self, lower_idx: usize) -> usize {
        self.offsets
            .get(lower_idx)
            .copied()
            .unwrap_or(self.raw.len())
    }

    /// Slice of the original text starting at a byte index of the lowercase form
    fn raw_from(&self, lower_idx: usize) -> &str {
        &self.raw[self.raw_index(lower_idx)..]
    }
}

impl std::fmt::Display for Utterance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

fn at_boundary(haystack: &str, start: usize, len: usize) -> bool {
    let before_ok = haystack[..start]
        .chars()
        .next_back()
        .is_none_or(|c| !is_word_char(c));
    let after_ok = haystack[start + len..]
        .chars()
        .next()
        .is_none_or(|c| !is_word_char(c));
    before_ok && after_ok
}

/// Byte index of the first word-boundary occurrence of `phrase` in `haystack`
pub fn find_phrase(haystack: &str, phrase: &str) -> Option<usize> {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return None;
    }
    haystack
        .match_indices(phrase)
        .map(|(idx, _)| idx)
        .find(|&idx| at_boundary(haystack, idx, phrase.len()))
}

/// Byte index of the last word-boundary occurrence of `phrase` in `haystack`
pub fn rfind_phrase(haystack: &str, phrase: &str) -> Option<usize> {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return None;
    }
    haystack
        .rmatch_indices(phrase)
        .map(|(idx, _)| idx)
        .find(|&idx| at_boundary(haystack, idx, phrase.len()))
}

pub fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    find_phrase(haystack, phrase).is_some()
}

/// Remove leading filler words, testing each filler once in list order
///
/// `"for the best pizza"` with `[for, about, the]` becomes `"best pizza"`.
pub fn strip_leading_fillers(text: &str, fillers: &[&str]) -> String {
    let mut rest = text.trim();
    for filler in fillers {
        if let Some(tail) = rest.strip_prefix(filler) {
            if tail.starts_with(char::is_whitespace) {
                rest = tail.trim_start();
            }
        }
    }
    rest.to_string()
}

/// Drop every whole word that equals one of `words` (case-insensitive)
///
/// Token based, so a name like "Filename" survives stripping "file" and "name".
pub fn remove_words(text: &str, words: &[&str]) -> String {
    text.split_whitespace()
        .filter(|token| {
            let bare = token.trim_matches(|c: char| c.is_ascii_punctuation());
            !words.iter().any(|w| bare.eq_ignore_ascii_case(w))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove every word-boundary occurrence of each phrase (case-insensitive)
pub fn remove_phrases(text: &str, phrases: &[&str]) -> String {
    Utterance::new(text).without_phrases(phrases)
}

/// Strip surrounding whitespace and quote characters picked up from speech
pub fn trim_quotes(text: &str) -> &str {
    text.trim().trim_matches(|c| c == '"' || c == '\'').trim()
}

/// Capitalize the first letter of every word
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_boundaries() {
        let u = Utterance::new("Please update my notes");
        assert!(!u.has("date"));
        assert!(!u.has("no"));
        assert!(u.has("update"));
        assert!(u.has("my notes"));

        let u = Utterance::new("what's the date today?");
        assert!(u.has("date"));
        assert!(u.has("today"));
    }

    #[test]
    fn test_raw_after_preserves_case() {
        let u = Utterance::new("Create folder Quarterly Reports on desktop");
        assert_eq!(
            u.raw_after("create folder"),
            Some("Quarterly Reports on desktop")
        );
        assert_eq!(u.lower_after("folder"), Some("quarterly reports on desktop"));
        assert_eq!(u.raw_before("on desktop"), Some("Create folder Quarterly Reports"));
    }

    #[test]
    fn test_raw_after_last() {
        let u = Utterance::new("please type this: Type Hello, World!");
        assert_eq!(u.raw_after_last("type"), Some("Hello, World!"));
    }

    #[test]
    fn test_offsets_with_multibyte_lowercase() {
        let u = Utterance::new("İstanbul type Merhaba");
        assert_eq!(u.raw_after_last("type"), Some("Merhaba"));
    }

    #[test]
    fn test_strip_leading_fillers() {
        let fillers = ["for", "about", "the", "a", "an", "please"];
        assert_eq!(strip_leading_fillers("the best pizza", &fillers), "best pizza");
        assert_eq!(strip_leading_fillers("for a laptop", &fillers), "laptop");
        // Only leading words, and only whole words
        assert_eq!(strip_leading_fillers("theory of everything", &fillers), "theory of everything");
        assert_eq!(strip_leading_fillers("best the pizza", &fillers), "best the pizza");
    }

    #[test]
    fn test_remove_words_is_token_based() {
        let fillers = ["called", "named", "name", "file", "folder", "as"];
        assert_eq!(remove_words("named Filename", &fillers), "Filename");
        assert_eq!(remove_words("as Basic Notes", &fillers), "Basic Notes");
        assert_eq!(remove_words("file called report", &fillers), "report");
    }

    #[test]
    fn test_remove_phrases() {
        assert_eq!(
            remove_phrases("open website github.com please", &["open website", "please"]),
            "github.com"
        );
        assert_eq!(remove_phrases("play lemon songs on", &["play", "on"]), "lemon songs");
    }

    #[test]
    fn test_remove_phrases_with_length_changing_lowercase() {
        // "ẞ" lowercases to 2 bytes from 3, "İ" to 3 bytes from 2
        assert_eq!(remove_phrases("ẞẞ please İİ", &["please"]), "ẞẞ İİ");
        assert_eq!(remove_phrases("İstanbul Please Straße", &["please"]), "İstanbul Straße");
        assert_eq!(remove_phrases("ÇA VA please", &["ça va"]), "please");
    }

    #[test]
    fn test_trim_quotes_and_title_case() {
        assert_eq!(trim_quotes(" \"report\" "), "report");
        assert_eq!(title_case("profile 2"), "Profile 2");
        assert_eq!(title_case("alisha"), "Alisha");
    }
}
