//! Intent router
//!
//! [`Router::resolve`] scans the ordered rule table and returns the first
//! command that matches; it performs no I/O. [`Router::route`] additionally
//! executes the command through the automation effector and hands back the
//! next [`SessionContext`]. The context is a value: callers keep whatever the
//! router returns and pass it into the next call.

mod command;
mod extract;
mod rules;

use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::automation::Automation;
use crate::config::AutomationConfig;
use crate::confirmation::PowerAction;
use crate::context::SessionContext;
use crate::utterance::Utterance;

pub use command::{Command, Location, google_search_url, random_people, youtube_search_url};
pub use rules::{RULES, Rule};

/// Rule grouping, used for logging and the command catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Info,
    Launch,
    Search,
    Browser,
    Window,
    Editor,
    Power,
    Pointer,
    Files,
    Media,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Info,
        Category::Launch,
        Category::Search,
        Category::Browser,
        Category::Window,
        Category::Editor,
        Category::Power,
        Category::Pointer,
        Category::Files,
        Category::Media,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Info => "Time, date and help",
            Category::Launch => "Applications",
            Category::Search => "Web search",
            Category::Browser => "Browser",
            Category::Window => "Active window",
            Category::Editor => "Documents",
            Category::Power => "System",
            Category::Pointer => "Mouse and scrolling",
            Category::Files => "Files and folders",
            Category::Media => "Media",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of routing one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteResult {
    /// Response text (effector outcome, fixed answer, or clarification)
    Handled(String),
    /// A power action that must pass the confirmation gate first
    SystemActionRequested(PowerAction),
    Unhandled,
}

/// Route result plus the context to use for the next turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub result: RouteResult,
    pub context: SessionContext,
}

/// A matched rule and the command it produced
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub rule: &'static str,
    pub category: Category,
    pub command: Command,
}

/// Knobs that commands need at execution time
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub home: PathBuf,
    pub scroll_amount: i32,
    pub max_key_repeat: u32,
    pub max_enter_repeat: u32,
    pub random_people_rows: usize,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self::from(&AutomationConfig::default())
    }
}

impl From<&AutomationConfig> for RouterSettings {
    fn from(config: &AutomationConfig) -> Self {
        Self {
            home: config.resolve_home(),
            scroll_amount: config.scroll_amount,
            max_key_repeat: config.max_key_repeat,
            max_enter_repeat: config.max_enter_repeat,
            random_people_rows: config.random_people_rows,
        }
    }
}

pub struct Router {
    settings: RouterSettings,
}

impl Router {
    pub fn new(settings: RouterSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// First matching rule, without side effects
    pub fn resolve(&self, utterance: &Utterance, context: &SessionContext) -> Option<Resolution> {
        if utterance.is_empty() {
            return None;
        }
        RULES.iter().find_map(|rule| {
            (rule.matcher)(utterance, context).map(|command| Resolution {
                rule: rule.name,
                category: rule.category,
                command,
            })
        })
    }

    /// Resolve and execute; never fails, effector errors come back as text
    #[hotpath::measure]
    pub fn route(
        &self,
        utterance: &Utterance,
        context: &SessionContext,
        automation: &mut dyn Automation,
    ) -> Routed {
        let Some(resolution) = self.resolve(utterance, context) else {
            debug!(utterance = %utterance, "no rule matched");
            return Routed {
                result: RouteResult::Unhandled,
                context: context.clone(),
            };
        };

        debug!(
            rule = resolution.rule,
            category = ?resolution.category,
            command = ?resolution.command,
            "rule matched"
        );
        let routed = resolution
            .command
            .execute(context, &self.settings, automation);
        if routed.context != *context {
            debug!(from = %context, to = %routed.context, "context changed");
        }
        routed
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RouterSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::{KeyName, Primitive, RecordingAutomation};
    use crate::context::AppTag;

    fn router() -> Router {
        Router::new(RouterSettings {
            home: PathBuf::from("/home/nova"),
            ..RouterSettings::default()
        })
    }

    fn handled(routed: &Routed) -> &str {
        match &routed.result {
            RouteResult::Handled(text) => text,
            other => panic!("expected Handled, got {other:?}"),
        }
    }

    #[test]
    fn test_time_beats_search() {
        let mut auto = RecordingAutomation::new();
        let routed = router().route(
            &Utterance::new("search what time is it"),
            &SessionContext::new(),
            &mut auto,
        );
        assert!(handled(&routed).starts_with("The current time is "));
        assert!(auto.calls().is_empty());
    }

    #[test]
    fn test_open_chrome_sets_context() {
        let mut auto = RecordingAutomation::new();
        let routed = router().route(
            &Utterance::new("open chrome"),
            &SessionContext::new(),
            &mut auto,
        );
        assert_eq!(routed.context.active_app(), Some(AppTag::Chrome));
        assert_eq!(handled(&routed), "Opening Google Chrome");
    }

    #[test]
    fn test_chrome_not_found_opens_default_browser() {
        struct NoChrome(RecordingAutomation);
        impl Automation for NoChrome {
            fn launch(&mut self, app: AppTag, _: Option<&str>) -> crate::automation::Outcome {
                Err(crate::error::AutomationError::NotFound(app.to_string()))
            }
            fn run(&mut self, p: Primitive) -> crate::automation::Outcome {
                self.0.run(p)
            }
            fn selected_text(&mut self) -> Result<String, crate::error::AutomationError> {
                Ok(String::new())
            }
            fn name(&self) -> &str {
                "no-chrome"
            }
        }

        let mut auto = NoChrome(RecordingAutomation::new());
        let ctx = SessionContext::new().with_app(AppTag::Notepad);
        let routed = router().route(&Utterance::new("open chrome"), &ctx, &mut auto);

        assert_eq!(handled(&routed), "Opening browser");
        assert_eq!(routed.context, ctx);
        assert_eq!(
            auto.0.primitives(),
            vec![&Primitive::OpenUrl("https://www.google.com".into())]
        );
    }

    #[test]
    fn test_power_phrase_is_deferred() {
        let mut auto = RecordingAutomation::new();
        let routed = router().route(
            &Utterance::new("please restart the computer"),
            &SessionContext::new(),
            &mut auto,
        );
        assert_eq!(
            routed.result,
            RouteResult::SystemActionRequested(PowerAction::Restart)
        );
        assert!(auto.calls().is_empty());
    }

    #[test]
    fn test_search_selection_requires_chrome() {
        let mut auto = RecordingAutomation::new().with_selection("rust ownership");
        let r = router();
        let u = Utterance::new("search this on chrome");

        let routed = r.route(&u, &SessionContext::new(), &mut auto);
        assert_eq!(handled(&routed), "Chrome is not the active window right now.");

        let chrome = SessionContext::new().with_app(AppTag::Chrome);
        r.route(&u, &chrome, &mut auto);
        assert_eq!(
            auto.primitives(),
            vec![&Primitive::BrowserAddress("rust ownership".into())]
        );
    }

    #[test]
    fn test_delete_then_yes_confirms_dialog() {
        let mut auto = RecordingAutomation::new();
        let r = router();

        let routed = r.route(
            &Utterance::new("delete everything"),
            &SessionContext::new(),
            &mut auto,
        );
        assert!(routed.context.dialog_open());

        let routed = r.route(&Utterance::new("yes"), &routed.context, &mut auto);
        assert_eq!(handled(&routed), "Confirming the active dialog");
        assert!(!routed.context.dialog_open());
        assert_eq!(
            auto.primitives(),
            vec![
                &Primitive::SelectAll,
                &Primitive::DeleteSelection,
                &Primitive::PressKey {
                    key: KeyName::Enter,
                    times: 1
                },
            ]
        );
    }

    #[test]
    fn test_resolve_has_no_side_effects() {
        let r = router();
        let ctx = SessionContext::new();
        let res = r.resolve(&Utterance::new("create folder Drafts"), &ctx).unwrap();
        assert_eq!(res.rule, "create-folder");
        assert_eq!(res.category, Category::Files);
        assert_eq!(
            res.command,
            Command::CreateFolder {
                name: "Drafts".into(),
                location: Location::Home
            }
        );
    }
}
