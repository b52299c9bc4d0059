//! Desktop automation effector
//!
//! The router never touches the OS directly. It asks an [`Automation`] to
//! launch an application or run one [`Primitive`], and gets back either the
//! sentence to speak or an [`AutomationError`].
//!
//! - [`DesktopAutomation`] drives the real desktop (process launch always,
//!   keyboard and mouse with the `desktop` feature)
//! - [`RecordingAutomation`] records what would have happened, for `--dry-run`
//!   and tests

mod desktop;
mod recording;

pub use desktop::DesktopAutomation;
pub use recording::{Invocation, RecordingAutomation};

use std::fmt;
use std::path::PathBuf;

use crate::confirmation::PowerAction;
use crate::context::AppTag;
use crate::error::AutomationError;

/// Outcome of an effector call: the sentence to speak, or why it failed
pub type Outcome = Result<String, AutomationError>;

/// Keys the assistant can press on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyName {
    Enter,
    Escape,
    Space,
    Backspace,
}

impl KeyName {
    pub fn label(self) -> &'static str {
        match self {
            KeyName::Enter => "enter",
            KeyName::Escape => "escape",
            KeyName::Space => "space",
            KeyName::Backspace => "backspace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabAction {
    New,
    Close,
    Next,
    Previous,
}

/// How a generated table is typed into the focused document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// One cell at a time, Tab between cells and Enter between rows
    Spreadsheet,
    /// Tab-separated lines typed as one block
    Document,
}

/// A single automation step against the focused window or the OS
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    SelectAll,
    DeleteSelection,
    CloseActiveWindow,
    TypeText(String),
    Save,
    /// Save As dialog, type the full target path, confirm
    SaveAs(PathBuf),
    /// Point an already open Save dialog at a folder and confirm
    SaveInto(PathBuf),
    NewDocument,
    NewSlide,
    PressKey { key: KeyName, times: u32 },
    Scroll { direction: ScrollDirection, amount: i32 },
    Click(MouseButton),
    Tab(TabAction),
    /// Focus the address bar of the active browser and submit `text`
    BrowserAddress(String),
    FillTable {
        layout: TableLayout,
        rows: Vec<Vec<String>>,
    },
    OpenUrl(String),
    OpenPath(PathBuf),
    OpenRecycleBin,
    CreateFolder(PathBuf),
    CloseApp(AppTag),
    Power(PowerAction),
}

impl Primitive {
    /// Sentence spoken after the primitive ran successfully
    pub fn describe(&self) -> String {
        match self {
            Primitive::SelectAll => "Selecting everything in the active window".into(),
            Primitive::DeleteSelection => {
                "Deleting the current selection in the active window".into()
            }
            Primitive::CloseActiveWindow => "Closing the active window".into(),
            Primitive::TypeText(text) => format!("Typing in the active window: {}", text),
            Primitive::Save => "Saving in the active window".into(),
            Primitive::SaveAs(path) => format!("Saving file as {}", path.display()),
            Primitive::SaveInto(dir) => {
                format!("Saving the current file to Desktop: {}", dir.display())
            }
            Primitive::NewDocument => "Creating a new document in the active window".into(),
            Primitive::NewSlide => "Adding a new slide in PowerPoint".into(),
            Primitive::PressKey {
                key: KeyName::Space,
                ..
            } => "Pressed space in the active window".into(),
            Primitive::PressKey { key, times } => {
                format!("Pressed {} {} time(s) in the active window", key.label(), times)
            }
            Primitive::Scroll {
                direction: ScrollDirection::Down,
                ..
            } => "Scrolled down in the active window".into(),
            Primitive::Scroll {
                direction: ScrollDirection::Up,
                ..
            } => "Scrolled up in the active window".into(),
            Primitive::Click(MouseButton::Left) => "Clicked at the current mouse position".into(),
            Primitive::Click(MouseButton::Right) => {
                "Right-clicked at the current mouse position".into()
            }
            Primitive::Tab(TabAction::New) => "Opening a new browser tab".into(),
            Primitive::Tab(TabAction::Close) => "Closing the current browser tab".into(),
            Primitive::Tab(TabAction::Next) => "Switching to the next browser tab".into(),
            Primitive::Tab(TabAction::Previous) => "Switching to the previous browser tab".into(),
            Primitive::BrowserAddress(text) => {
                format!("Searching in the active browser window: {}", text)
            }
            Primitive::FillTable { layout, rows } => match layout {
                TableLayout::Spreadsheet => format!(
                    "Filled Excel sheet with random data for {} people",
                    rows.len().saturating_sub(1)
                ),
                TableLayout::Document => "Inserted random people table into Word".into(),
            },
            Primitive::OpenUrl(url) => format!("Opening website: {}", url),
            Primitive::OpenPath(path) => format!("Opening {}", path.display()),
            Primitive::OpenRecycleBin => "Opening Recycle Bin".into(),
            Primitive::CreateFolder(path) => format!("Created folder: {}", path.display()),
            Primitive::CloseApp(app) => format!("Closing application: {}", app),
            Primitive::Power(PowerAction::Shutdown) => "Shutting down the computer".into(),
            Primitive::Power(PowerAction::Restart) => "Restarting the computer".into(),
            Primitive::Power(PowerAction::Sleep) => "Putting the computer to sleep".into(),
        }
    }

    /// Whether the primitive commonly leaves a confirmation dialog on screen
    pub fn may_raise_dialog(&self) -> bool {
        matches!(
            self,
            Primitive::DeleteSelection
                | Primitive::CloseActiveWindow
                | Primitive::Save
                | Primitive::SaveAs(_)
        )
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::TypeText(text) => write!(f, "type {:?}", text),
            Primitive::FillTable { layout, rows } => {
                write!(f, "fill table ({:?}, {} rows)", layout, rows.len())
            }
            other => write!(f, "{:?}", other),
        }
    }
}

/// The narrow interface the router drives the desktop through
pub trait Automation {
    /// Start `app`, optionally with a browser profile; best effort
    fn launch(&mut self, app: AppTag, profile: Option<&str>) -> Outcome;

    /// Run one primitive against the focused window or the OS
    fn run(&mut self, primitive: Primitive) -> Outcome;

    /// Text currently selected in the focused window (copied via the clipboard)
    fn selected_text(&mut self) -> Result<String, AutomationError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

impl<T: Automation + ?Sized> Automation for Box<T> {
    fn launch(&mut self, app: AppTag, profile: Option<&str>) -> Outcome {
        (**self).launch(app, profile)
    }

    fn run(&mut self, primitive: Primitive) -> Outcome {
        (**self).run(primitive)
    }

    fn selected_text(&mut self) -> Result<String, AutomationError> {
        (**self).selected_text()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_key_presses() {
        let p = Primitive::PressKey {
            key: KeyName::Backspace,
            times: 3,
        };
        assert_eq!(p.describe(), "Pressed backspace 3 time(s) in the active window");

        let p = Primitive::PressKey {
            key: KeyName::Space,
            times: 1,
        };
        assert_eq!(p.describe(), "Pressed space in the active window");
    }

    #[test]
    fn test_describe_spreadsheet_counts_data_rows() {
        let rows = vec![
            vec!["Name".into(), "Age".into(), "Number".into()],
            vec!["Ali Khan".into(), "30".into(), "03001234567".into()],
            vec!["Sara Malik".into(), "22".into(), "03111234567".into()],
        ];
        let p = Primitive::FillTable {
            layout: TableLayout::Spreadsheet,
            rows,
        };
        assert_eq!(p.describe(), "Filled Excel sheet with random data for 2 people");
    }

    #[test]
    fn test_dialog_raising_primitives() {
        assert!(Primitive::Save.may_raise_dialog());
        assert!(Primitive::DeleteSelection.may_raise_dialog());
        assert!(!Primitive::SelectAll.may_raise_dialog());
        assert!(!Primitive::TypeText("hi".into()).may_raise_dialog());
    }
}
