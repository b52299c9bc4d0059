//! The ordered rule table
//!
//! Order is precedence: the first matcher that returns a command wins. Fixed
//! answers come first, generic keyword rules ("play", "folder") come last.

use crate::automation::{KeyName, MouseButton, ScrollDirection, TabAction, TableLayout};
use crate::confirmation::PowerAction;
use crate::context::{AppTag, SessionContext};
use crate::utterance::Utterance;

use super::Category;
use super::command::Command;
use super::extract::{self, BROWSER_SEARCH_TRIGGERS, WEBSITE_TRIGGERS, WebTarget};

pub type Matcher = fn(&Utterance, &SessionContext) -> Option<Command>;

/// One entry of the rule table
pub struct Rule {
    pub name: &'static str,
    pub category: Category,
    pub matcher: Matcher,
}

const fn rule(name: &'static str, category: Category, matcher: Matcher) -> Rule {
    Rule {
        name,
        category,
        matcher,
    }
}

pub static RULES: &[Rule] = &[
    rule("time", Category::Info, time),
    rule("date", Category::Info, date),
    rule("help", Category::Info, help),
    rule("open-chrome", Category::Launch, open_chrome),
    rule("open-notepad", Category::Launch, open_notepad),
    rule("open-word", Category::Launch, open_word),
    rule("open-excel", Category::Launch, open_excel),
    rule("open-powerpoint", Category::Launch, open_powerpoint),
    rule("web-search", Category::Search, web_search),
    rule("recycle-bin", Category::Files, recycle_bin),
    rule("dialog-confirm", Category::Window, dialog_confirm),
    rule("dialog-dismiss", Category::Window, dialog_dismiss),
    rule("close-app", Category::Launch, close_app),
    rule("close-window", Category::Window, close_window),
    rule("chrome-profile", Category::Browser, chrome_profile),
    rule("open-profile", Category::Browser, open_profile),
    rule("open-website", Category::Browser, open_website),
    rule("whatsapp", Category::Browser, whatsapp),
    rule("chatgpt", Category::Browser, chatgpt),
    rule("select-all", Category::Window, select_all),
    rule("delete", Category::Window, delete),
    rule("search-selection", Category::Browser, search_selection),
    rule("browser-search", Category::Browser, browser_search),
    rule("space", Category::Window, space),
    rule("backspace", Category::Window, backspace),
    rule("enter", Category::Window, enter),
    rule("type", Category::Editor, type_text),
    rule("new-document", Category::Editor, new_document),
    rule("new-slide", Category::Editor, new_slide),
    rule("fill-people", Category::Editor, fill_people),
    rule("save-as", Category::Editor, save_as),
    rule("save-to-desktop", Category::Editor, save_to_desktop),
    rule("save", Category::Editor, save),
    rule("shutdown", Category::Power, shutdown),
    rule("restart", Category::Power, restart),
    rule("sleep", Category::Power, sleep),
    rule("scroll-down", Category::Pointer, scroll_down),
    rule("scroll-up", Category::Pointer, scroll_up),
    rule("right-click", Category::Pointer, right_click),
    rule("left-click", Category::Pointer, left_click),
    rule("new-tab", Category::Browser, new_tab),
    rule("next-tab", Category::Browser, next_tab),
    rule("previous-tab", Category::Browser, previous_tab),
    rule("close-tab", Category::Browser, close_tab),
    rule("create-folder", Category::Files, create_folder),
    rule("open-folder", Category::Files, open_folder),
    rule("youtube", Category::Media, youtube),
];

/// Utterances containing these are never a plain Google search
const SEARCH_EXCLUSIONS: &[&str] = &[
    "search in chrome",
    "search in browser",
    "chrome search",
    "browser search",
    "search this on chrome",
    "search this in chrome",
    "search selected text",
    "search youtube",
    "youtube",
];

const DELETE_TRIGGERS: &[&str] = &[
    "delete this",
    "delete selected",
    "delete everything",
    "delete all",
];
const BACKSPACE_TRIGGERS: &[&str] = &[
    "backspace",
    "back space",
    "delete character",
    "remove character",
];

const YES_WORDS: &[&str] = &["yes", "ok", "okay", "confirm"];
const NO_WORDS: &[&str] = &["no", "cancel", "abort"];
const REPLY_FILLERS: &[&str] = &["please", "it", "that", "thanks"];

const PEOPLE_TRIGGERS: &[&str] = &[
    "10 random people",
    "ten random people",
    "random people data",
    "people table",
    "insert table for 10 people",
];

fn when(cond: bool, command: Command) -> Option<Command> {
    cond.then_some(command)
}

// ============================================================================
// Fixed answers
// ============================================================================

fn time(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["what time", "current time", "time"]),
        Command::TellTime,
    )
}

fn date(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["date", "what date", "today's date", "todays date"]),
        Command::TellDate,
    )
}

fn help(u: &Utterance, _: &SessionContext) -> Option<Command> {
    let bare = u.lower().trim_end_matches(['?', '.', '!']);
    when(
        matches!(bare, "help" | "commands")
            || u.has_any(&["what can you do", "list commands", "show commands"]),
        Command::Help,
    )
}

// ============================================================================
// Applications
// ============================================================================

fn launch(u: &Utterance, phrases: &[&str], app: AppTag) -> Option<Command> {
    when(u.has_any(phrases) && !u.has("close"), Command::Launch(app))
}

fn open_chrome(u: &Utterance, _: &SessionContext) -> Option<Command> {
    if u.has_any(&["profile", "open chrome with"]) {
        return None;
    }
    launch(
        u,
        &["open chrome", "open google chrome", "google chrome"],
        AppTag::Chrome,
    )
}

fn open_notepad(u: &Utterance, _: &SessionContext) -> Option<Command> {
    launch(u, &["open notepad", "notepad"], AppTag::Notepad)
}

fn open_word(u: &Utterance, _: &SessionContext) -> Option<Command> {
    launch(u, &["open word", "microsoft word"], AppTag::Word)
}

fn open_excel(u: &Utterance, _: &SessionContext) -> Option<Command> {
    launch(u, &["open excel", "microsoft excel"], AppTag::Excel)
}

fn open_powerpoint(u: &Utterance, _: &SessionContext) -> Option<Command> {
    launch(
        u,
        &["open powerpoint", "open power point", "microsoft powerpoint"],
        AppTag::PowerPoint,
    )
}

fn close_app(u: &Utterance, _: &SessionContext) -> Option<Command> {
    let table: [(&[&str], AppTag); 5] = [
        (&["close chrome", "close google chrome", "close browser"], AppTag::Chrome),
        (&["close notepad"], AppTag::Notepad),
        (&["close word", "close microsoft word"], AppTag::Word),
        (&["close excel", "close microsoft excel"], AppTag::Excel),
        (
            &["close powerpoint", "close power point", "close microsoft powerpoint"],
            AppTag::PowerPoint,
        ),
    ];
    table
        .into_iter()
        .find(|(phrases, _)| u.has_any(phrases))
        .map(|(_, app)| Command::CloseApp(app))
}

fn close_window(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["close it", "close this", "close window"]) && !u.has("tab"),
        Command::CloseWindow,
    )
}

fn recycle_bin(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["recycle bin", "dustbin"]),
        Command::OpenRecycleBin,
    )
}

// ============================================================================
// Search
// ============================================================================

fn web_search(u: &Utterance, _: &SessionContext) -> Option<Command> {
    if !u.has("search") || u.has_any(SEARCH_EXCLUSIONS) {
        return None;
    }
    extract::search_query(u).map(Command::GoogleSearch)
}

fn search_selection(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&[
            "search this on chrome",
            "search this in chrome",
            "search selected text",
        ]),
        Command::SearchSelection,
    )
}

fn browser_search(u: &Utterance, _: &SessionContext) -> Option<Command> {
    if !u.has_any(BROWSER_SEARCH_TRIGGERS) {
        return None;
    }
    Some(match extract::browser_search_query(u) {
        Some(query) => Command::SearchInBrowser(query),
        None => Command::Say("What should I search for?".into()),
    })
}

fn youtube(u: &Utterance, _: &SessionContext) -> Option<Command> {
    if !u.has_any(&["search youtube for", "youtube", "play"]) {
        return None;
    }
    extract::youtube_query(u).map(Command::YouTube)
}

// ============================================================================
// Dialog replies
// ============================================================================

/// `Some(true)` for a bare "yes"/"ok please", `Some(false)` for "no"/"cancel it"
fn standalone_reply(u: &Utterance) -> Option<bool> {
    let tokens: Vec<&str> = u
        .lower()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    let all_in = |set: &[&str]| {
        tokens
            .iter()
            .all(|t| set.contains(t) || REPLY_FILLERS.contains(t))
    };
    let any_in = |set: &[&str]| tokens.iter().any(|t| set.contains(t));

    if any_in(YES_WORDS) && all_in(YES_WORDS) {
        Some(true)
    } else if any_in(NO_WORDS) && all_in(NO_WORDS) {
        Some(false)
    } else {
        None
    }
}

fn dialog_confirm(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(standalone_reply(u) == Some(true), Command::DialogReply(true))
}

fn dialog_dismiss(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(standalone_reply(u) == Some(false), Command::DialogReply(false))
}

// ============================================================================
// Browser
// ============================================================================

fn chrome_profile(u: &Utterance, _: &SessionContext) -> Option<Command> {
    let trigger = u.first_of(&["open chrome with", "chrome profile"])?;
    Some(
        match extract::profile_name(u, trigger, &["account", "name", "profile"]) {
            Some(profile) => Command::LaunchProfile(profile),
            None => Command::Say("Which Chrome profile should I open?".into()),
        },
    )
}

fn open_profile(u: &Utterance, _: &SessionContext) -> Option<Command> {
    let trigger = u.first_of(&["open profile", "profile"])?;
    extract::profile_name(u, trigger, &["open", "account", "name", "profile"])
        .map(Command::LaunchProfile)
}

fn open_website(u: &Utterance, _: &SessionContext) -> Option<Command> {
    if !u.has_any(WEBSITE_TRIGGERS) {
        return None;
    }
    Some(match extract::website_target(u) {
        Some(WebTarget::Url(url)) => Command::OpenWebsite(url),
        Some(WebTarget::Search(query)) => Command::GoogleSearch(query),
        None => Command::Say("Which website should I open?".into()),
    })
}

fn whatsapp(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["whatsapp", "whats app"]),
        Command::OpenWebApp("https://web.whatsapp.com"),
    )
}

fn chatgpt(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["chatgpt", "chat gpt", "open ai chat"]),
        Command::OpenWebApp("https://chatgpt.com"),
    )
}

fn new_tab(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["new tab", "open tab"]),
        Command::Tab(TabAction::New),
    )
}

fn next_tab(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["next tab", "switch tab"]),
        Command::Tab(TabAction::Next),
    )
}

fn previous_tab(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["previous tab", "last tab"]),
        Command::Tab(TabAction::Previous),
    )
}

fn close_tab(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["close tab", "close this tab", "close the tab"]),
        Command::Tab(TabAction::Close),
    )
}

// ============================================================================
// Active window
// ============================================================================

fn select_all(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["select all", "select everything"]),
        Command::SelectAll,
    )
}

fn delete(u: &Utterance, _: &SessionContext) -> Option<Command> {
    if !u.has_any(DELETE_TRIGGERS) {
        return None;
    }
    Some(Command::Delete {
        select_all_first: u.has_any(&["delete everything", "delete all"]),
    })
}

fn press(u: &Utterance, key: KeyName) -> Option<Command> {
    Some(Command::Press {
        key,
        times: extract::repeat_count(u),
    })
}

fn space(u: &Utterance, _: &SessionContext) -> Option<Command> {
    if !u.has("space") || u.has_any(&["backspace", "back space"]) {
        return None;
    }
    press(u, KeyName::Space)
}

fn backspace(u: &Utterance, _: &SessionContext) -> Option<Command> {
    if !u.has_any(BACKSPACE_TRIGGERS) {
        return None;
    }
    press(u, KeyName::Backspace)
}

fn enter(u: &Utterance, _: &SessionContext) -> Option<Command> {
    if !u.has_any(&["enter", "press enter", "next line", "new line", "line break"]) {
        return None;
    }
    press(u, KeyName::Enter)
}

// ============================================================================
// Editors
// ============================================================================

fn type_text(u: &Utterance, _: &SessionContext) -> Option<Command> {
    if !u.has("type") {
        return None;
    }
    extract::typed_text(u).map(Command::Type)
}

fn new_document(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["new file", "new document", "new note"]),
        Command::NewDocument,
    )
}

fn new_slide(u: &Utterance, ctx: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["add slide", "new slide"]) && ctx.is_active(AppTag::PowerPoint),
        Command::NewSlide,
    )
}

fn fill_people(u: &Utterance, ctx: &SessionContext) -> Option<Command> {
    if !u.has_any(PEOPLE_TRIGGERS) {
        return None;
    }
    match ctx.active_app() {
        Some(AppTag::Excel) => Some(Command::FillPeople(TableLayout::Spreadsheet)),
        Some(AppTag::Word) => Some(Command::FillPeople(TableLayout::Document)),
        _ => None,
    }
}

fn save_as(u: &Utterance, _: &SessionContext) -> Option<Command> {
    Some(match extract::save_as_target(u)? {
        Ok((name, location)) => Command::SaveAs { name, location },
        Err(unclear) => Command::Say(unclear.0.into()),
    })
}

fn save_to_desktop(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["save on desktop", "save to desktop"]),
        Command::SaveToDesktop,
    )
}

fn save(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["save this", "save it", "save note", "save file"]),
        Command::Save,
    )
}

// ============================================================================
// Power
// ============================================================================

fn shutdown(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["shutdown", "shut down"]),
        Command::Power(PowerAction::Shutdown),
    )
}

fn restart(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["restart", "reboot"]),
        Command::Power(PowerAction::Restart),
    )
}

fn sleep(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["sleep", "sleep mode"]),
        Command::Power(PowerAction::Sleep),
    )
}

// ============================================================================
// Pointer
// ============================================================================

fn scroll_down(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["scroll down", "page down"]),
        Command::Scroll(ScrollDirection::Down),
    )
}

fn scroll_up(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["scroll up", "page up"]),
        Command::Scroll(ScrollDirection::Up),
    )
}

fn right_click(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["right click", "right-click"]),
        Command::Click(MouseButton::Right),
    )
}

fn left_click(u: &Utterance, _: &SessionContext) -> Option<Command> {
    when(
        u.has_any(&["click that", "left click", "click"]),
        Command::Click(MouseButton::Left),
    )
}

// ============================================================================
// Files
// ============================================================================

fn create_folder(u: &Utterance, _: &SessionContext) -> Option<Command> {
    Some(match extract::folder_to_create(u)? {
        Ok((name, location)) => Command::CreateFolder { name, location },
        Err(unclear) => Command::Say(unclear.0.into()),
    })
}

fn open_folder(u: &Utterance, _: &SessionContext) -> Option<Command> {
    if !u.has("folder") {
        return None;
    }
    let (location, name) = extract::folder_to_open(u)?;
    Some(Command::OpenFolder { location, name })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(text: &str, ctx: &SessionContext) -> Option<(&'static str, Command)> {
        let u = Utterance::new(text);
        RULES
            .iter()
            .find_map(|r| (r.matcher)(&u, ctx).map(|c| (r.name, c)))
    }

    fn name_of(text: &str) -> Option<&'static str> {
        first(text, &SessionContext::new()).map(|(n, _)| n)
    }

    #[test]
    fn test_rule_names_are_unique() {
        let mut names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RULES.len());
    }

    #[test]
    fn test_standalone_reply() {
        assert_eq!(standalone_reply(&Utterance::new("yes")), Some(true));
        assert_eq!(standalone_reply(&Utterance::new("Okay, please.")), Some(true));
        assert_eq!(standalone_reply(&Utterance::new("cancel it")), Some(false));
        assert_eq!(standalone_reply(&Utterance::new("no thanks, open chrome")), None);
        assert_eq!(standalone_reply(&Utterance::new("please")), None);
    }

    #[test]
    fn test_no_thanks_still_opens_chrome() {
        assert_eq!(name_of("no thanks, open chrome"), Some("open-chrome"));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(name_of("search for the time in tokyo"), Some("time"));
        assert_eq!(name_of("search youtube for lofi"), Some("youtube"));
        assert_eq!(name_of("search this on chrome"), Some("search-selection"));
        assert_eq!(name_of("search in chrome rust traits"), Some("browser-search"));
        assert_eq!(name_of("close chrome"), Some("close-app"));
        assert_eq!(name_of("close this tab"), Some("close-tab"));
        assert_eq!(name_of("close this"), Some("close-window"));
        assert_eq!(name_of("open chrome with work profile"), Some("chrome-profile"));
        assert_eq!(name_of("open profile personal"), Some("open-profile"));
        assert_eq!(name_of("press backspace"), Some("backspace"));
        assert_eq!(name_of("press space"), Some("space"));
        assert_eq!(name_of("right click"), Some("right-click"));
        assert_eq!(name_of("new tab"), Some("new-tab"));
        assert_eq!(name_of("new document"), Some("new-document"));
    }

    #[test]
    fn test_save_rules_are_all_reachable() {
        assert_eq!(name_of("save file with name notes"), Some("save-as"));
        assert_eq!(name_of("save to desktop"), Some("save-to-desktop"));
        assert_eq!(name_of("save this"), Some("save"));
    }

    #[test]
    fn test_context_gated_rules() {
        let excel = SessionContext::new().with_app(AppTag::Excel);
        let word = SessionContext::new().with_app(AppTag::Word);
        let chrome = SessionContext::new().with_app(AppTag::Chrome);

        assert_eq!(
            first("fill 10 random people", &excel).map(|(_, c)| c),
            Some(Command::FillPeople(TableLayout::Spreadsheet))
        );
        assert_eq!(
            first("fill 10 random people", &word).map(|(_, c)| c),
            Some(Command::FillPeople(TableLayout::Document))
        );
        assert_eq!(first("fill 10 random people", &chrome), None);

        let ppt = SessionContext::new().with_app(AppTag::PowerPoint);
        assert_eq!(
            first("add slide", &ppt).map(|(n, _)| n),
            Some("new-slide")
        );
        assert_eq!(first("add slide", &chrome), None);
    }

    #[test]
    fn test_power_phrases() {
        assert_eq!(
            first("shut down the computer", &SessionContext::new()).map(|(_, c)| c),
            Some(Command::Power(PowerAction::Shutdown))
        );
        assert_eq!(
            first("reboot", &SessionContext::new()).map(|(_, c)| c),
            Some(Command::Power(PowerAction::Restart))
        );
    }

    #[test]
    fn test_every_trigger_phrase_reaches_its_rule() {
        let table: &[(&str, &[&str])] = &[
            ("time", &["time", "what time", "current time"]),
            ("date", &["date", "what date", "today's date", "todays date"]),
            ("open-chrome", &["open chrome", "open google chrome", "google chrome"]),
            ("open-notepad", &["open notepad", "notepad"]),
            ("open-word", &["open word", "microsoft word"]),
            ("open-excel", &["open excel", "microsoft excel"]),
            ("open-powerpoint", &["open powerpoint", "microsoft powerpoint"]),
            (
                "web-search",
                &[
                    "search for pizza",
                    "search google for pizza",
                    "search google pizza",
                    "search pizza",
                ],
            ),
            ("recycle-bin", &["recycle bin", "dustbin"]),
            ("dialog-confirm", &["yes", "confirm", "ok", "okay"]),
            ("dialog-dismiss", &["no", "cancel", "abort"]),
            ("close-app", &["close chrome", "close notepad"]),
            ("close-window", &["close it", "close this", "close window"]),
            ("chrome-profile", &["open chrome with work", "chrome profile work"]),
            ("open-profile", &["open profile alisha", "profile alisha"]),
            (
                "open-website",
                &[
                    "open website github.com",
                    "website open github.com",
                    "site open github.com",
                    "open site github.com",
                ],
            ),
            ("whatsapp", &["open whatsapp", "whatsapp"]),
            ("chatgpt", &["chatgpt", "chat gpt", "open ai chat"]),
            ("select-all", &["select everything", "select all"]),
            ("delete", &["delete this", "delete everything", "delete all"]),
            (
                "search-selection",
                &["search this on chrome", "search this in chrome", "search selected text"],
            ),
            (
                "browser-search",
                &[
                    "search in chrome rust",
                    "search in browser rust",
                    "chrome search rust",
                    "browser search rust",
                ],
            ),
            ("space", &["space", "add space", "insert space"]),
            ("backspace", &["backspace", "delete character", "remove character"]),
            (
                "enter",
                &["enter", "press enter", "next line", "new line", "line break"],
            ),
            ("type", &["type hello world"]),
            ("new-document", &["new file"]),
            ("save", &["save this", "save it", "save note", "save file"]),
            ("save-to-desktop", &["save on desktop", "save to desktop"]),
            ("save-as", &["save file with name report on desktop"]),
            ("shutdown", &["shutdown", "shut down"]),
            ("restart", &["restart", "reboot"]),
            ("sleep", &["sleep", "sleep mode"]),
            ("scroll-down", &["scroll down", "page down"]),
            ("scroll-up", &["scroll up", "page up"]),
            ("left-click", &["click that", "click", "left click"]),
            ("right-click", &["right click", "right-click"]),
            ("new-tab", &["new tab", "open new tab"]),
            ("next-tab", &["next tab", "switch to next tab"]),
            ("previous-tab", &["previous tab", "switch to previous tab"]),
            ("close-tab", &["close tab", "close this tab"]),
            ("create-folder", &["create folder Projects on desktop"]),
            ("open-folder", &["open folder downloads", "folder downloads"]),
            (
                "youtube",
                &["search youtube for lofi", "youtube lofi beats", "play despacito"],
            ),
        ];
        for (rule, phrases) in table {
            for phrase in *phrases {
                assert_eq!(name_of(phrase), Some(*rule), "{phrase:?}");
            }
        }

        let excel = SessionContext::new().with_app(AppTag::Excel);
        for phrase in PEOPLE_TRIGGERS {
            assert_eq!(first(phrase, &excel).map(|(n, _)| n), Some("fill-people"), "{phrase:?}");
        }
    }

    #[test]
    fn test_character_deletes_are_backspace() {
        for text in ["delete character", "remove character", "delete character 3 times"] {
            assert!(
                matches!(
                    first(text, &SessionContext::new()),
                    Some((
                        "backspace",
                        Command::Press {
                            key: KeyName::Backspace,
                            ..
                        }
                    ))
                ),
                "{text:?}"
            );
        }
        // Bare "delete" no longer wipes the selection
        assert_eq!(name_of("delete"), None);
        assert_eq!(
            first("delete all", &SessionContext::new()).map(|(_, c)| c),
            Some(Command::Delete {
                select_all_first: true
            })
        );
    }

    #[test]
    fn test_search_this_is_only_excluded_for_chrome() {
        assert_eq!(
            first("search this weekend events", &SessionContext::new()).map(|(_, c)| c),
            Some(Command::GoogleSearch("this weekend events".into()))
        );
        assert_eq!(name_of("search selected text"), Some("search-selection"));
    }

    #[test]
    fn test_non_ascii_text_does_not_panic() {
        assert_eq!(
            first("type ẞẞ please İİ", &SessionContext::new()).map(|(_, c)| c),
            Some(Command::Type("ẞẞ İİ".into()))
        );
        assert_eq!(
            first("search for Ünïcödé İstanbul", &SessionContext::new()).map(|(n, _)| n),
            Some("web-search")
        );
        assert_eq!(
            first("open website münchen.de", &SessionContext::new()).map(|(_, c)| c),
            Some(Command::OpenWebsite("https://münchen.de".into()))
        );
        assert_eq!(name_of("create folder Ärger on desktop"), Some("create-folder"));
    }

    #[test]
    fn test_unmatched() {
        assert_eq!(name_of("tell me a joke"), None);
        assert_eq!(name_of("how are you feeling"), None);
        assert_eq!(name_of(""), None);
    }
}
