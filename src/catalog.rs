//! Command catalog - what `nova commands` prints and what "help" summarizes

use std::fmt::Write;

use crate::context::AppTag;
use crate::router::Category;

/// One documented command
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// Rule name in the router table
    pub rule: &'static str,
    pub category: Category,
    pub description: &'static str,
    pub examples: &'static [&'static str],
    /// Only available while this app is active
    pub requires: Option<AppTag>,
}

const fn entry(
    rule: &'static str,
    category: Category,
    description: &'static str,
    examples: &'static [&'static str],
) -> CatalogEntry {
    CatalogEntry {
        rule,
        category,
        description,
        examples,
        requires: None,
    }
}

const fn entry_in(
    app: AppTag,
    rule: &'static str,
    category: Category,
    description: &'static str,
    examples: &'static [&'static str],
) -> CatalogEntry {
    CatalogEntry {
        rule,
        category,
        description,
        examples,
        requires: Some(app),
    }
}

pub static CATALOG: &[CatalogEntry] = &[
    entry("time", Category::Info, "Tell the current time", &["what time is it"]),
    entry("date", Category::Info, "Tell today's date", &["what's the date today"]),
    entry("help", Category::Info, "Summarize what I can do", &["help", "what can you do"]),
    entry("open-chrome", Category::Launch, "Open Google Chrome", &["open chrome"]),
    entry("open-notepad", Category::Launch, "Open Notepad", &["open notepad"]),
    entry("open-word", Category::Launch, "Open Microsoft Word", &["open word"]),
    entry("open-excel", Category::Launch, "Open Microsoft Excel", &["open excel"]),
    entry(
        "open-powerpoint",
        Category::Launch,
        "Open Microsoft PowerPoint",
        &["open powerpoint"],
    ),
    entry(
        "close-app",
        Category::Launch,
        "Close a running application",
        &["close chrome", "close excel"],
    ),
    entry(
        "web-search",
        Category::Search,
        "Search Google",
        &["search for best pizza places", "search weather today"],
    ),
    entry(
        "recycle-bin",
        Category::Files,
        "Open the Recycle Bin",
        &["open recycle bin"],
    ),
    entry(
        "dialog-confirm",
        Category::Window,
        "Accept a dialog I just caused (save, delete, close)",
        &["yes", "okay"],
    ),
    entry(
        "dialog-dismiss",
        Category::Window,
        "Dismiss a dialog I just caused",
        &["no", "cancel"],
    ),
    entry(
        "close-window",
        Category::Window,
        "Close the active window",
        &["close this window"],
    ),
    entry(
        "chrome-profile",
        Category::Browser,
        "Open Chrome with a profile",
        &["open chrome with work profile"],
    ),
    entry(
        "open-profile",
        Category::Browser,
        "Open a Chrome profile",
        &["open profile personal"],
    ),
    entry(
        "open-website",
        Category::Browser,
        "Open a website, or search for it",
        &["open website github.com"],
    ),
    entry("whatsapp", Category::Browser, "Open WhatsApp Web", &["open whatsapp"]),
    entry("chatgpt", Category::Browser, "Open ChatGPT", &["open chatgpt"]),
    entry(
        "select-all",
        Category::Window,
        "Select everything in the active window",
        &["select all"],
    ),
    entry(
        "delete",
        Category::Window,
        "Delete the selection",
        &["delete this", "delete everything"],
    ),
    entry(
        "search-selection",
        Category::Browser,
        "Search the selected text in Chrome",
        &["search this on chrome"],
    ),
    entry(
        "browser-search",
        Category::Browser,
        "Search in the open browser window",
        &["search in chrome rust traits"],
    ),
    entry("space", Category::Window, "Press space", &["press space"]),
    entry(
        "backspace",
        Category::Window,
        "Press backspace, optionally several times",
        &["backspace three times"],
    ),
    entry(
        "enter",
        Category::Window,
        "Press enter, optionally several times",
        &["press enter", "new line"],
    ),
    entry(
        "type",
        Category::Editor,
        "Type text into the active window",
        &["type Hello, World!"],
    ),
    entry(
        "new-document",
        Category::Editor,
        "Create a new document",
        &["new document"],
    ),
    entry_in(
        AppTag::PowerPoint,
        "new-slide",
        Category::Editor,
        "Add a slide in PowerPoint",
        &["add slide"],
    ),
    entry_in(
        AppTag::Excel,
        "fill-people",
        Category::Editor,
        "Fill Excel or Word with random people data",
        &["insert 10 random people"],
    ),
    entry(
        "save-as",
        Category::Editor,
        "Save under a name, on the Desktop or in Documents",
        &["save file with name Report on desktop"],
    ),
    entry(
        "save-to-desktop",
        Category::Editor,
        "Save to the Desktop",
        &["save to desktop"],
    ),
    entry("save", Category::Editor, "Save in place", &["save this"]),
    entry(
        "shutdown",
        Category::Power,
        "Shut down (asks first)",
        &["shut down the computer"],
    ),
    entry("restart", Category::Power, "Restart (asks first)", &["restart"]),
    entry("sleep", Category::Power, "Sleep (asks first)", &["sleep mode"]),
    entry("scroll-down", Category::Pointer, "Scroll down", &["scroll down"]),
    entry("scroll-up", Category::Pointer, "Scroll up", &["scroll up"]),
    entry("right-click", Category::Pointer, "Right-click", &["right click"]),
    entry("left-click", Category::Pointer, "Left-click", &["click"]),
    entry("new-tab", Category::Browser, "Open a new tab", &["new tab"]),
    entry("next-tab", Category::Browser, "Switch to the next tab", &["next tab"]),
    entry(
        "previous-tab",
        Category::Browser,
        "Switch to the previous tab",
        &["previous tab"],
    ),
    entry("close-tab", Category::Browser, "Close the current tab", &["close tab"]),
    entry(
        "create-folder",
        Category::Files,
        "Create a folder",
        &["create folder Projects on desktop"],
    ),
    entry(
        "open-folder",
        Category::Files,
        "Open Desktop, Documents, Downloads or a Desktop folder",
        &["open folder downloads"],
    ),
    entry(
        "youtube",
        Category::Media,
        "Search YouTube",
        &["search youtube for lofi beats", "play despacito"],
    ),
];

/// Full listing grouped by category
pub fn render() -> String {
    let mut out = String::new();
    for category in Category::ALL {
        let entries: Vec<_> = CATALOG.iter().filter(|e| e.category == category).collect();
        if entries.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{}", category);
        for e in entries {
            let examples = e
                .examples
                .iter()
                .map(|x| format!("\"{}\"", x))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = write!(out, "  {:<40} {}", e.description, examples);
            if let Some(app) = e.requires {
                let _ = write!(out, "  (with {} open)", app);
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Short answer for the "help" utterance
pub fn spoken_summary() -> String {
    "I can tell you the time and date, open and close Chrome, Notepad, Word, Excel and \
     PowerPoint, search Google and YouTube, type and save in your documents, work with \
     tabs, scrolling and clicks, create and open folders, and shut down or restart the \
     computer after you confirm. Anything else, just ask me."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SessionContext;
    use crate::router::{RULES, Router};
    use crate::utterance::Utterance;

    #[test]
    fn test_every_entry_names_a_rule() {
        for e in CATALOG {
            assert!(
                RULES.iter().any(|r| r.name == e.rule && r.category == e.category),
                "catalog entry {} has no matching rule",
                e.rule
            );
        }
    }

    #[test]
    fn test_examples_resolve_to_their_rule() {
        let router = Router::default();
        for e in CATALOG {
            let ctx = match e.requires {
                Some(app) => SessionContext::new().with_app(app),
                None => SessionContext::new(),
            };
            for example in e.examples {
                let resolved = router.resolve(&Utterance::new(example), &ctx);
                assert_eq!(
                    resolved.map(|r| r.rule),
                    Some(e.rule),
                    "example {:?}",
                    example
                );
            }
        }
    }

    #[test]
    fn test_render_groups_by_category() {
        let text = render();
        assert!(text.starts_with("Time, date and help\n"));
        assert!(text.contains("\"open chrome\""));
        assert!(text.contains("(with Microsoft PowerPoint open)"));
    }
}
