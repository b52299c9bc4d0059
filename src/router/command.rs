//! Resolved commands and their execution against the automation effector

use std::path::{Path, PathBuf};

use chrono::Local;
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, warn};

use crate::automation::{
    Automation, KeyName, MouseButton, Primitive, ScrollDirection, TabAction, TableLayout,
};
use crate::confirmation::PowerAction;
use crate::context::{AppTag, SessionContext};
use crate::error::AutomationError;

use super::{RouteResult, Routed, RouterSettings};

/// Well-known folders under the home directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Home,
    Desktop,
    Documents,
    Downloads,
}

impl Location {
    pub fn resolve(self, home: &Path) -> PathBuf {
        match self {
            Location::Home => home.to_path_buf(),
            Location::Desktop => home.join("Desktop"),
            Location::Documents => home.join("Documents"),
            Location::Downloads => home.join("Downloads"),
        }
    }
}

/// What an utterance asked for, before anything runs
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    TellTime,
    TellDate,
    Help,
    Launch(AppTag),
    LaunchProfile(String),
    GoogleSearch(String),
    SearchSelection,
    SearchInBrowser(String),
    OpenRecycleBin,
    /// Enter (true) or Escape (false) on a dialog the assistant raised
    DialogReply(bool),
    CloseApp(AppTag),
    CloseWindow,
    OpenWebsite(String),
    /// Site that reuses the active Chrome window when there is one
    OpenWebApp(&'static str),
    SelectAll,
    Delete { select_all_first: bool },
    Press { key: KeyName, times: Option<u32> },
    Type(String),
    NewDocument,
    NewSlide,
    FillPeople(TableLayout),
    Save,
    SaveToDesktop,
    SaveAs { name: String, location: Location },
    Power(PowerAction),
    Scroll(ScrollDirection),
    Click(MouseButton),
    Tab(TabAction),
    CreateFolder { name: String, location: Location },
    OpenFolder { location: Location, name: Option<String> },
    YouTube(String),
    /// Fixed reply, nothing executed (unclear names, nothing to confirm)
    Say(String),
}

const FIRST_NAMES: &[&str] = &[
    "Ali", "Sara", "Ahmed", "Fatima", "Usman", "Alisha", "Hassan", "Zara",
];
const LAST_NAMES: &[&str] = &["Khan", "Saeed", "Malik", "Sheikh", "Siddiqui", "Hussain"];

/// Header plus `count` rows of Name / Age / Number
pub fn random_people<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(count + 1);
    rows.push(vec!["Name".to_string(), "Age".to_string(), "Number".to_string()]);
    for _ in 0..count {
        let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Ali");
        let last = LAST_NAMES.choose(rng).copied().unwrap_or("Khan");
        let age = rng.random_range(18..=60);
        let number: String = std::iter::once("03".to_string())
            .chain((0..9).map(|_| rng.random_range(0..10).to_string()))
            .collect();
        rows.push(vec![format!("{} {}", first, last), age.to_string(), number]);
    }
    rows
}

pub fn google_search_url(query: &str) -> String {
    format!(
        "https://www.google.com/search?q={}",
        urlencoding::encode(query)
    )
}

pub fn youtube_search_url(query: &str) -> String {
    format!(
        "https://www.youtube.com/results?search_query={}",
        urlencoding::encode(query)
    )
}

impl Command {
    /// Phrase used in "Sorry, I couldn't ..." when the effector fails
    fn attempt(&self) -> String {
        match self {
            Command::Launch(app) => format!("open {}", app),
            Command::LaunchProfile(_) => "open Chrome with that account".into(),
            Command::GoogleSearch(_) => "open Google search".into(),
            Command::SearchSelection | Command::SearchInBrowser(_) => {
                "search in the browser".into()
            }
            Command::OpenRecycleBin => "open the Recycle Bin".into(),
            Command::DialogReply(_) => "interact with the dialog".into(),
            Command::CloseApp(app) => format!("close {}", app),
            Command::CloseWindow => "close the active window".into(),
            Command::OpenWebsite(_) | Command::OpenWebApp(_) => "open the website".into(),
            Command::SelectAll => "select everything".into(),
            Command::Delete { .. } => "delete the selection".into(),
            Command::Press { key, .. } => format!("press {}", key.label()),
            Command::Type(_) => "type in the active window".into(),
            Command::NewDocument => "create a new document".into(),
            Command::NewSlide => "add a new slide".into(),
            Command::FillPeople(TableLayout::Spreadsheet) => {
                "fill Excel with random people data".into()
            }
            Command::FillPeople(TableLayout::Document) => {
                "insert random people data in Word".into()
            }
            Command::Save => "save in the active window".into(),
            Command::SaveToDesktop => "save on Desktop".into(),
            Command::SaveAs { .. } => "save the file with that name".into(),
            Command::Scroll(ScrollDirection::Down) => "scroll down".into(),
            Command::Scroll(ScrollDirection::Up) => "scroll up".into(),
            Command::Click(MouseButton::Left) => "click".into(),
            Command::Click(MouseButton::Right) => "right-click".into(),
            Command::Tab(TabAction::New) => "open a new tab".into(),
            Command::Tab(TabAction::Close) => "close the tab".into(),
            Command::Tab(TabAction::Next) => "switch to the next tab".into(),
            Command::Tab(TabAction::Previous) => "switch to the previous tab".into(),
            Command::CreateFolder { .. } => "create that folder".into(),
            Command::OpenFolder { .. } => "open that path".into(),
            Command::YouTube(_) => "search YouTube".into(),
            Command::TellTime
            | Command::TellDate
            | Command::Help
            | Command::Power(_)
            | Command::Say(_) => "do that".into(),
        }
    }

    /// Run the command; effector failures become spoken sentences
    pub fn execute(
        self,
        context: &SessionContext,
        settings: &RouterSettings,
        automation: &mut dyn Automation,
    ) -> Routed {
        let attempt = self.attempt();
        match self.run(context, settings, automation) {
            Ok(routed) => routed,
            Err(e) => {
                warn!(error = %e, attempt, "effector failed");
                Routed {
                    result: RouteResult::Handled(format!("Sorry, I couldn't {}. {}", attempt, e)),
                    context: context.clone(),
                }
            }
        }
    }

    fn run(
        self,
        ctx: &SessionContext,
        settings: &RouterSettings,
        auto: &mut dyn Automation,
    ) -> Result<Routed, AutomationError> {
        let handled = |text: String, context: SessionContext| Routed {
            result: RouteResult::Handled(text),
            context,
        };

        // Primitives that run as-is and only touch the dialog flag
        let simple = |auto: &mut dyn Automation, p: Primitive| -> Result<Routed, AutomationError> {
            let raises = p.may_raise_dialog();
            let text = auto.run(p)?;
            Ok(handled(text, ctx.with_dialog(raises)))
        };

        match self {
            Command::TellTime => Ok(handled(
                format!("The current time is {}", Local::now().format("%I:%M %p")),
                ctx.clone(),
            )),
            Command::TellDate => Ok(handled(
                format!("Today's date is {}", Local::now().format("%B %d, %Y")),
                ctx.clone(),
            )),
            Command::Help => Ok(handled(crate::catalog::spoken_summary(), ctx.clone())),
            Command::Say(text) => Ok(handled(text, ctx.clone())),
            Command::Power(kind) => Ok(Routed {
                result: RouteResult::SystemActionRequested(kind),
                context: ctx.clone(),
            }),

            Command::Launch(app) => match auto.launch(app, None) {
                Ok(text) => Ok(handled(text, ctx.with_app(app))),
                Err(AutomationError::NotFound(_)) if app == AppTag::Chrome => {
                    open_default_browser(ctx, auto)
                }
                Err(e) => Err(e),
            },
            Command::LaunchProfile(profile) => match auto.launch(AppTag::Chrome, Some(&profile)) {
                Ok(text) => Ok(handled(text, ctx.with_chrome_profile(profile))),
                Err(AutomationError::NotFound(_)) => open_default_browser(ctx, auto),
                Err(e) => Err(e),
            },

            Command::GoogleSearch(query) => {
                auto.run(Primitive::OpenUrl(google_search_url(&query)))?;
                Ok(handled(
                    format!("Opening Google search for: {}", query),
                    ctx.with_dialog(false),
                ))
            }
            Command::YouTube(query) => {
                auto.run(Primitive::OpenUrl(youtube_search_url(&query)))?;
                Ok(handled(
                    format!("Searching YouTube for {}", query),
                    ctx.with_dialog(false),
                ))
            }
            Command::SearchSelection => {
                if !ctx.is_active(AppTag::Chrome) {
                    return Ok(handled(
                        "Chrome is not the active window right now.".into(),
                        ctx.clone(),
                    ));
                }
                let selected = auto.selected_text()?;
                if selected.trim().is_empty() {
                    return Ok(handled(
                        "No text is currently selected on screen. \
                         Please select some text first, then say 'search this on Chrome'."
                            .into(),
                        ctx.clone(),
                    ));
                }
                simple(auto, Primitive::BrowserAddress(selected.trim().to_string()))
            }
            Command::SearchInBrowser(query) => simple(auto, Primitive::BrowserAddress(query)),

            Command::OpenRecycleBin => {
                let text = auto.run(Primitive::OpenRecycleBin)?;
                Ok(handled(text, ctx.with_app(AppTag::RecycleBin)))
            }
            Command::DialogReply(accept) => {
                if !ctx.dialog_open() {
                    return Ok(handled(
                        "There is nothing waiting for a yes or no right now.".into(),
                        ctx.clone(),
                    ));
                }
                let key = if accept { KeyName::Enter } else { KeyName::Escape };
                auto.run(Primitive::PressKey { key, times: 1 })?;
                let text = if accept {
                    "Confirming the active dialog"
                } else {
                    "Dismissing the active dialog"
                };
                Ok(handled(text.into(), ctx.with_dialog(false)))
            }
            Command::CloseApp(app) => {
                let text = auto.run(Primitive::CloseApp(app))?;
                Ok(handled(text, ctx.closing(app)))
            }
            Command::CloseWindow => {
                let text = auto.run(Primitive::CloseActiveWindow)?;
                // Whatever was in front is gone; an unsaved-changes prompt may follow
                Ok(handled(text, ctx.cleared().with_dialog(true)))
            }

            Command::OpenWebsite(url) => simple(auto, Primitive::OpenUrl(url)),
            Command::OpenWebApp(url) => {
                if ctx.is_active(AppTag::Chrome) {
                    simple(auto, Primitive::BrowserAddress(url.to_string()))
                } else {
                    simple(auto, Primitive::OpenUrl(url.to_string()))
                }
            }

            Command::SelectAll => simple(auto, Primitive::SelectAll),
            Command::Delete { select_all_first } => {
                if select_all_first {
                    auto.run(Primitive::SelectAll)?;
                }
                simple(auto, Primitive::DeleteSelection)
            }
            Command::Press { key, times } => {
                let max = match key {
                    KeyName::Enter => settings.max_enter_repeat,
                    _ => settings.max_key_repeat,
                };
                let times = times.unwrap_or(1).clamp(1, max.max(1));
                simple(auto, Primitive::PressKey { key, times })
            }
            Command::Type(text) => simple(auto, Primitive::TypeText(text)),
            Command::NewDocument => simple(auto, Primitive::NewDocument),
            Command::NewSlide => simple(auto, Primitive::NewSlide),
            Command::FillPeople(layout) => {
                let rows = random_people(&mut rand::rng(), settings.random_people_rows);
                debug!(rows = rows.len(), ?layout, "generated people table");
                simple(auto, Primitive::FillTable { layout, rows })
            }

            Command::Save => simple(auto, Primitive::Save),
            Command::SaveToDesktop => {
                let dir = Location::Desktop.resolve(&settings.home);
                simple(auto, Primitive::SaveInto(dir))
            }
            Command::SaveAs { name, location } => {
                let path = location.resolve(&settings.home).join(name);
                simple(auto, Primitive::SaveAs(path))
            }

            Command::Scroll(direction) => simple(
                auto,
                Primitive::Scroll {
                    direction,
                    amount: settings.scroll_amount,
                },
            ),
            Command::Click(button) => simple(auto, Primitive::Click(button)),
            Command::Tab(action) => simple(auto, Primitive::Tab(action)),

            Command::CreateFolder { name, location } => {
                let path = location.resolve(&settings.home).join(name);
                simple(auto, Primitive::CreateFolder(path))
            }
            Command::OpenFolder { location, name } => {
                let base = location.resolve(&settings.home);
                let path = match name {
                    Some(name) => base.join(name),
                    None => base,
                };
                simple(auto, Primitive::OpenPath(path))
            }
        }
    }
}

/// No Chrome binary: show the default browser, context stays as it was
fn open_default_browser(
    ctx: &SessionContext,
    auto: &mut dyn Automation,
) -> Result<Routed, AutomationError> {
    warn!("chrome not found, opening default browser");
    auto.run(Primitive::OpenUrl("https://www.google.com".into()))?;
    Ok(Routed {
        result: RouteResult::Handled("Opening browser".into()),
        context: ctx.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::automation::RecordingAutomation;

    fn settings() -> RouterSettings {
        RouterSettings {
            home: PathBuf::from("/home/nova"),
            ..RouterSettings::default()
        }
    }

    #[test]
    fn test_random_people_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let rows = random_people(&mut rng, 10);
        assert_eq!(rows.len(), 11);
        assert_eq!(rows[0], vec!["Name", "Age", "Number"]);
        for row in &rows[1..] {
            let age: u32 = row[1].parse().unwrap();
            assert!((18..=60).contains(&age));
            assert_eq!(row[2].len(), 11);
            assert!(row[2].starts_with("03"));
            assert!(row[2].chars().all(|c| c.is_ascii_digit()));
            assert_eq!(row[0].split(' ').count(), 2);
        }
    }

    #[test]
    fn test_search_urls_are_encoded() {
        assert_eq!(
            google_search_url("best pizza & pasta"),
            "https://www.google.com/search?q=best%20pizza%20%26%20pasta"
        );
        assert!(youtube_search_url("lofi beats").ends_with("search_query=lofi%20beats"));
    }

    #[test]
    fn test_failure_becomes_sentence_and_keeps_context() {
        let mut auto = RecordingAutomation::new();
        auto.fail_next("winword exited with 1");
        let ctx = SessionContext::new().with_app(AppTag::Notepad);

        let routed = Command::Launch(AppTag::Word).execute(&ctx, &settings(), &mut auto);
        match routed.result {
            RouteResult::Handled(text) => {
                assert!(text.starts_with("Sorry, I couldn't open Microsoft Word."));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(routed.context, ctx);
    }

    #[test]
    fn test_key_repeat_is_clamped() {
        let mut auto = RecordingAutomation::new();
        let ctx = SessionContext::new();
        Command::Press {
            key: KeyName::Enter,
            times: Some(40),
        }
        .execute(&ctx, &settings(), &mut auto);
        Command::Press {
            key: KeyName::Backspace,
            times: Some(0),
        }
        .execute(&ctx, &settings(), &mut auto);

        assert_eq!(
            auto.primitives(),
            vec![
                &Primitive::PressKey {
                    key: KeyName::Enter,
                    times: 5
                },
                &Primitive::PressKey {
                    key: KeyName::Backspace,
                    times: 1
                },
            ]
        );
    }

    #[test]
    fn test_save_as_resolves_under_home() {
        let mut auto = RecordingAutomation::new();
        let routed = Command::SaveAs {
            name: "report".into(),
            location: Location::Documents,
        }
        .execute(&SessionContext::new(), &settings(), &mut auto);

        assert_eq!(
            auto.primitives(),
            vec![&Primitive::SaveAs(PathBuf::from("/home/nova/Documents/report"))]
        );
        assert!(routed.context.dialog_open());
    }

    #[test]
    fn test_dialog_reply_without_dialog_is_noop() {
        let mut auto = RecordingAutomation::new();
        let ctx = SessionContext::new().with_app(AppTag::Excel);
        let routed = Command::DialogReply(false).execute(&ctx, &settings(), &mut auto);

        assert!(auto.calls().is_empty());
        assert_eq!(routed.context, ctx);
        assert_eq!(
            routed.result,
            RouteResult::Handled("There is nothing waiting for a yes or no right now.".into())
        );
    }

    #[test]
    fn test_search_selection_needs_chrome_and_text() {
        let chrome = SessionContext::new().with_app(AppTag::Chrome);

        let mut auto = RecordingAutomation::new().with_selection("rust borrow checker");
        let routed =
            Command::SearchSelection.execute(&SessionContext::new(), &settings(), &mut auto);
        assert_eq!(
            routed.result,
            RouteResult::Handled("Chrome is not the active window right now.".into())
        );
        assert!(auto.calls().is_empty());

        Command::SearchSelection.execute(&chrome, &settings(), &mut auto);
        assert_eq!(
            auto.primitives(),
            vec![&Primitive::BrowserAddress("rust borrow checker".into())]
        );

        let mut empty = RecordingAutomation::new();
        let routed = Command::SearchSelection.execute(&chrome, &settings(), &mut empty);
        match routed.result {
            RouteResult::Handled(text) => assert!(text.starts_with("No text is currently selected")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(empty.calls().is_empty());
    }

    #[test]
    fn test_web_app_reuses_active_chrome() {
        let mut auto = RecordingAutomation::new();
        let chrome = SessionContext::new().with_app(AppTag::Chrome);
        Command::OpenWebApp("https://web.whatsapp.com").execute(&chrome, &settings(), &mut auto);
        Command::OpenWebApp("https://web.whatsapp.com").execute(
            &SessionContext::new(),
            &settings(),
            &mut auto,
        );

        assert_eq!(
            auto.primitives(),
            vec![
                &Primitive::BrowserAddress("https://web.whatsapp.com".into()),
                &Primitive::OpenUrl("https://web.whatsapp.com".into()),
            ]
        );
    }
}
