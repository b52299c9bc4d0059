//! Session context - which application the assistant believes is in front
//!
//! The context is a plain value. The router receives the current context and
//! hands back the next one; nothing else in the crate mutates it. "Active" is
//! the assistant's own belief (what it last opened), never an OS query.

use std::fmt;

/// Applications the router can launch, close or address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppTag {
    Chrome,
    Notepad,
    Word,
    Excel,
    PowerPoint,
    RecycleBin,
}

impl AppTag {
    pub const ALL: [AppTag; 6] = [
        AppTag::Chrome,
        AppTag::Notepad,
        AppTag::Word,
        AppTag::Excel,
        AppTag::PowerPoint,
        AppTag::RecycleBin,
    ];

    /// Name used in spoken responses
    pub fn display_name(self) -> &'static str {
        match self {
            AppTag::Chrome => "Chrome",
            AppTag::Notepad => "Notepad",
            AppTag::Word => "Microsoft Word",
            AppTag::Excel => "Microsoft Excel",
            AppTag::PowerPoint => "Microsoft PowerPoint",
            AppTag::RecycleBin => "Recycle Bin",
        }
    }

    /// True for apps whose documents can be saved and typed into
    pub fn is_editor(self) -> bool {
        matches!(
            self,
            AppTag::Notepad | AppTag::Word | AppTag::Excel | AppTag::PowerPoint
        )
    }
}

impl fmt::Display for AppTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// What the assistant believes is on screen
///
/// Invariant: `active_profile` is only ever `Some` while `active_app` is Chrome.
/// Fields are private so every change goes through the methods below.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    active_app: Option<AppTag>,
    active_profile: Option<String>,
    dialog_open: bool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_app(&self) -> Option<AppTag> {
        self.active_app
    }

    pub fn active_profile(&self) -> Option<&str> {
        self.active_profile.as_deref()
    }

    /// Whether the last action may have left a confirmation dialog up
    pub fn dialog_open(&self) -> bool {
        self.dialog_open
    }

    pub fn is_active(&self, app: AppTag) -> bool {
        self.active_app == Some(app)
    }

    /// Mark `app` as opened; any browser profile is forgotten
    pub fn with_app(&self, app: AppTag) -> Self {
        Self {
            active_app: Some(app),
            active_profile: None,
            dialog_open: false,
        }
    }

    /// Chrome opened with a named profile
    pub fn with_chrome_profile(&self, profile: impl Into<String>) -> Self {
        Self {
            active_app: Some(AppTag::Chrome),
            active_profile: Some(profile.into()),
            dialog_open: false,
        }
    }

    /// Forget everything (explicit close)
    pub fn cleared(&self) -> Self {
        Self::default()
    }

    /// Clear only if `app` is the active one
    pub fn closing(&self, app: AppTag) -> Self {
        if self.is_active(app) {
            self.cleared()
        } else {
            self.with_dialog(false)
        }
    }

    pub fn with_dialog(&self, open: bool) -> Self {
        Self {
            dialog_open: open,
            ..self.clone()
        }
    }
}

impl fmt::Display for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.active_app, &self.active_profile) {
            (Some(app), Some(profile)) => write!(f, "{} ({})", app, profile),
            (Some(app), None) => write!(f, "{}", app),
            (None, _) => write!(f, "none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_cleared_when_switching_app() {
        let ctx = SessionContext::new().with_chrome_profile("Profile 2");
        assert_eq!(ctx.active_profile(), Some("Profile 2"));

        let ctx = ctx.with_app(AppTag::Notepad);
        assert_eq!(ctx.active_app(), Some(AppTag::Notepad));
        assert_eq!(ctx.active_profile(), None);
    }

    #[test]
    fn test_closing_only_clears_matching_app() {
        let ctx = SessionContext::new().with_app(AppTag::Word);
        assert_eq!(ctx.closing(AppTag::Excel).active_app(), Some(AppTag::Word));
        assert_eq!(ctx.closing(AppTag::Word), SessionContext::new());
    }

    #[test]
    fn test_dialog_flag() {
        let ctx = SessionContext::new().with_app(AppTag::Notepad).with_dialog(true);
        assert!(ctx.dialog_open());
        assert!(ctx.is_active(AppTag::Notepad));
        // Opening something new dismisses the notion of a dialog
        assert!(!ctx.with_app(AppTag::Excel).dialog_open());
    }

    #[test]
    fn test_display() {
        assert_eq!(SessionContext::new().to_string(), "none");
        assert_eq!(
            SessionContext::new().with_chrome_profile("Work").to_string(),
            "Chrome (Work)"
        );
    }
}
