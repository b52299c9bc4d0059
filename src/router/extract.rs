//! Parsers that pull arguments (queries, names, counts) out of an utterance

use std::sync::LazyLock;

use regex::Regex;

use crate::utterance::{
    contains_phrase, remove_phrases, remove_words, strip_leading_fillers, title_case, trim_quotes,
    Utterance,
};

use super::command::Location;

const SEARCH_PATTERNS: &[&str] = &["search for", "search google for", "search google"];
const SEARCH_FILLERS: &[&str] = &["for", "about", "the", "a", "an", "please"];

const SAVE_AS_TRIGGER: &str = "save file with name";
const SAVE_AS_FILLERS: &[&str] = &["called", "named", "name", "file", "folder", "as"];

pub const WEBSITE_TRIGGERS: &[&str] = &["open website", "website open", "site open", "open site"];
pub const BROWSER_SEARCH_TRIGGERS: &[&str] = &[
    "search in chrome",
    "search in browser",
    "chrome search",
    "browser search",
];

const NUMBER_WORDS: &[&str] = &[
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
];

static DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\p{L}\p{N}\-]+\.[a-zA-Z]{2,})(/[^\s]*)?").expect("domain pattern is valid")
});

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

fn trim_sentence_end(s: &str) -> &str {
    s.trim().trim_end_matches(['?', '.', '!']).trim()
}

/// Google query for "search for X" / "search google for X" / "search google X" / "search X"
pub fn search_query(u: &Utterance) -> Option<String> {
    let query = match SEARCH_PATTERNS.iter().find_map(|p| u.lower_after(p)) {
        Some(q) => q,
        None => u.lower().strip_prefix("search ")?.trim(),
    };
    non_empty(strip_leading_fillers(trim_sentence_end(query), SEARCH_FILLERS))
}

/// Query for "search in chrome X" style utterances
pub fn browser_search_query(u: &Utterance) -> Option<String> {
    let mut phrases = BROWSER_SEARCH_TRIGGERS.to_vec();
    phrases.extend(["search", "please"]);
    non_empty(remove_phrases(trim_sentence_end(u.lower()), &phrases))
}

/// Profile name after `trigger`, fillers removed, title-cased
pub fn profile_name(u: &Utterance, trigger: &str, fillers: &[&str]) -> Option<String> {
    let rest = u.lower_after(trigger)?;
    non_empty(title_case(&remove_words(trim_sentence_end(rest), fillers)))
}

/// Where "open website X" should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebTarget {
    Url(String),
    Search(String),
}

pub fn website_target(u: &Utterance) -> Option<WebTarget> {
    let mut phrases = WEBSITE_TRIGGERS.to_vec();
    phrases.push("please");
    let cleaned = remove_phrases(u.lower(), &phrases);
    if cleaned.is_empty() {
        return None;
    }
    match DOMAIN.find(&cleaned) {
        Some(m) => Some(WebTarget::Url(normalize_url(m.as_str()))),
        None => Some(WebTarget::Search(cleaned)),
    }
}

pub fn normalize_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Literal text after the last "type", original casing kept
pub fn typed_text(u: &Utterance) -> Option<String> {
    let suffix = u.raw_after_last("type")?;
    let text = if contains_phrase(&suffix.to_lowercase(), "please") {
        remove_phrases(suffix, &["please"])
    } else {
        suffix.to_string()
    };
    non_empty(text)
}

/// Explicit repeat count: "3 times", "five times", "twice"
pub fn repeat_count(u: &Utterance) -> Option<u32> {
    let tokens: Vec<&str> = u
        .lower()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.contains(&"twice") {
        return Some(2);
    }
    if tokens.contains(&"once") {
        return Some(1);
    }
    tokens.windows(2).find_map(|w| {
        if w[1] != "times" {
            return None;
        }
        w[0].parse().ok().or_else(|| {
            NUMBER_WORDS
                .iter()
                .position(|n| *n == w[0])
                .map(|i| i as u32 + 1)
        })
    })
}

/// Why a name could not be extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unclear(pub &'static str);

/// "save file with name X [on desktop|in documents]"
pub fn save_as_target(u: &Utterance) -> Option<Result<(String, Location), Unclear>> {
    let after = Utterance::new(u.raw_after(SAVE_AS_TRIGGER)?);

    let mut location = Location::Desktop;
    let mut name = after.raw();
    for marker in ["on desktop", "in desktop"] {
        if let Some(before) = after.raw_before(marker) {
            name = before;
            location = Location::Desktop;
            break;
        }
    }
    for marker in ["in documents", "on documents"] {
        if let Some(before) = after.raw_before(marker) {
            name = before;
            location = Location::Documents;
            break;
        }
    }

    let name = remove_words(name, SAVE_AS_FILLERS);
    let name = trim_quotes(&name).replace(['"', '\''], "");
    if name.is_empty() {
        return Some(Err(Unclear(
            "File name was not clear. Please specify a file name.",
        )));
    }
    Some(Ok((name, location)))
}

/// "create folder X [on desktop|in documents]"
pub fn folder_to_create(u: &Utterance) -> Option<Result<(String, Location), Unclear>> {
    let after = u.raw_after("create folder")?;
    let after_u = Utterance::new(after);

    let (name, location) = if after_u.has("on desktop") {
        (remove_phrases(after, &["on desktop"]), Location::Desktop)
    } else if after_u.has("in documents") {
        (remove_phrases(after, &["in documents"]), Location::Documents)
    } else {
        (after.to_string(), Location::Home)
    };

    let name = trim_quotes(&name).to_string();
    if name.is_empty() {
        return Some(Err(Unclear(
            "Folder name was not clear. Please specify a folder name.",
        )));
    }
    Some(Ok((name, location)))
}

/// Folder for "open folder X" / "folder X": a known location, or a Desktop subfolder
pub fn folder_to_open(u: &Utterance) -> Option<(Location, Option<String>)> {
    let rest = u.raw_after("open folder").or_else(|| u.raw_after("folder"))?;
    let name = remove_words(rest, &["open", "please"]);
    let name = trim_quotes(trim_sentence_end(&name)).to_string();
    if name.is_empty() {
        return None;
    }
    let target = match name.to_lowercase().as_str() {
        "desktop" => (Location::Desktop, None),
        "documents" => (Location::Documents, None),
        "downloads" => (Location::Downloads, None),
        _ => (Location::Desktop, Some(name)),
    };
    Some(target)
}

/// YouTube query: tail after the keyword, "play"/"on" dropped, longer than 2 chars
pub fn youtube_query(u: &Utterance) -> Option<String> {
    let lower = u.lower();
    let tail = ["search youtube for", "play on youtube", "youtube"]
        .iter()
        .find_map(|k| {
            crate::utterance::rfind_phrase(lower, k).map(|idx| lower[idx + k.len()..].trim())
        })
        .unwrap_or(lower);
    let query = remove_words(trim_sentence_end(tail), &["play", "on"]);
    if query.chars().count() > 2 {
        Some(query)
    } else {
        None
    }
}
