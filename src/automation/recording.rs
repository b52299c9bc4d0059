//! Automation that only records what it was asked to do

use crate::context::AppTag;
use crate::error::AutomationError;

use super::{Automation, Outcome, Primitive};

/// One recorded effector call
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Launch {
        app: AppTag,
        profile: Option<String>,
    },
    Run(Primitive),
}

/// Dry-run effector: every call succeeds with the usual sentence and is logged
#[derive(Debug, Default)]
pub struct RecordingAutomation {
    calls: Vec<Invocation>,
    selection: String,
    fail_next: Option<String>,
}

impl RecordingAutomation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text returned by `selected_text`
    pub fn with_selection(mut self, text: impl Into<String>) -> Self {
        self.selection = text.into();
        self
    }

    /// Make the next launch or run fail with `message`
    pub fn fail_next(&mut self, message: impl Into<String>) {
        self.fail_next = Some(message.into());
    }

    pub fn calls(&self) -> &[Invocation] {
        &self.calls
    }

    /// Primitives run so far, in order
    pub fn primitives(&self) -> Vec<&Primitive> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Invocation::Run(p) => Some(p),
                Invocation::Launch { .. } => None,
            })
            .collect()
    }

    pub fn count(&self, primitive: &Primitive) -> usize {
        self.primitives().into_iter().filter(|p| *p == primitive).count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    fn take_failure(&mut self) -> Result<(), AutomationError> {
        match self.fail_next.take() {
            Some(message) => Err(AutomationError::CommandFailed(message)),
            None => Ok(()),
        }
    }
}

impl Automation for RecordingAutomation {
    fn launch(&mut self, app: AppTag, profile: Option<&str>) -> Outcome {
        self.calls.push(Invocation::Launch {
            app,
            profile: profile.map(str::to_string),
        });
        self.take_failure()?;
        tracing::info!(%app, ?profile, "[dry-run] launch");
        Ok(match profile {
            Some(profile) => format!("Opening Chrome with profile {}", profile),
            None if app == AppTag::Chrome => "Opening Google Chrome".to_string(),
            None => format!("Opening {}", app),
        })
    }

    fn run(&mut self, primitive: Primitive) -> Outcome {
        self.calls.push(Invocation::Run(primitive.clone()));
        self.take_failure()?;
        tracing::info!(%primitive, "[dry-run] run");
        Ok(primitive.describe())
    }

    fn selected_text(&mut self) -> Result<String, AutomationError> {
        Ok(self.selection.clone())
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::KeyName;

    #[test]
    fn test_records_calls_in_order() {
        let mut auto = RecordingAutomation::new();
        auto.launch(AppTag::Notepad, None).unwrap();
        auto.run(Primitive::TypeText("hello".into())).unwrap();

        assert_eq!(
            auto.calls(),
            &[
                Invocation::Launch {
                    app: AppTag::Notepad,
                    profile: None
                },
                Invocation::Run(Primitive::TypeText("hello".into())),
            ]
        );
    }

    #[test]
    fn test_fail_next_is_one_shot() {
        let mut auto = RecordingAutomation::new();
        auto.fail_next("boom");
        assert!(auto.run(Primitive::Save).is_err());
        assert!(auto.run(Primitive::Save).is_ok());
        assert_eq!(auto.count(&Primitive::Save), 2);
    }

    #[test]
    fn test_chrome_launch_messages() {
        let mut auto = RecordingAutomation::new();
        assert_eq!(
            auto.launch(AppTag::Chrome, Some("Profile 1")).unwrap(),
            "Opening Chrome with profile Profile 1"
        );
        assert_eq!(auto.launch(AppTag::Chrome, None).unwrap(), "Opening Google Chrome");
        let out = auto
            .run(Primitive::PressKey {
                key: KeyName::Enter,
                times: 2,
            })
            .unwrap();
        assert_eq!(out, "Pressed enter 2 time(s) in the active window");
    }
}
