//! Real desktop effector
//!
//! Process launch, URLs, folders and power actions work in every build.
//! Keyboard, mouse and clipboard control need the `desktop` feature (enigo +
//! arboard); without it those primitives fail with a spoken explanation.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::confirmation::PowerAction;
use crate::context::AppTag;
use crate::error::AutomationError;

use super::{Automation, Outcome, Primitive};

// ============================================================================
// Launch table
// ============================================================================

/// One way of starting an application: program plus fixed arguments
type Candidate = (&'static str, &'static [&'static str]);

fn candidates(app: AppTag) -> &'static [Candidate] {
    match app {
        AppTag::Chrome => &[
            ("google-chrome", &[]),
            ("google-chrome-stable", &[]),
            ("chromium", &[]),
            ("chromium-browser", &[]),
            ("chrome", &[]),
        ],
        AppTag::Notepad => &[
            ("notepad", &[]),
            ("gnome-text-editor", &[]),
            ("gedit", &[]),
            ("kate", &[]),
            ("mousepad", &[]),
        ],
        AppTag::Word => &[("winword", &[]), ("libreoffice", &["--writer"])],
        AppTag::Excel => &[("excel", &[]), ("libreoffice", &["--calc"])],
        AppTag::PowerPoint => &[("powerpnt", &[]), ("libreoffice", &["--impress"])],
        AppTag::RecycleBin => &[],
    }
}

/// Install locations that are rarely on PATH
#[cfg(target_os = "windows")]
fn known_paths(app: AppTag) -> Vec<PathBuf> {
    match app {
        AppTag::Chrome => vec![
            PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
            PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
        ],
        _ => Vec::new(),
    }
}

#[cfg(not(target_os = "windows"))]
fn known_paths(_app: AppTag) -> Vec<PathBuf> {
    Vec::new()
}

#[cfg(target_os = "macos")]
fn mac_bundle(app: AppTag) -> Option<&'static str> {
    match app {
        AppTag::Chrome => Some("Google Chrome"),
        AppTag::Notepad => Some("TextEdit"),
        AppTag::Word => Some("Microsoft Word"),
        AppTag::Excel => Some("Microsoft Excel"),
        AppTag::PowerPoint => Some("Microsoft PowerPoint"),
        AppTag::RecycleBin => None,
    }
}

/// Process names used when closing an application
fn process_names(app: AppTag) -> &'static [&'static str] {
    if cfg!(target_os = "windows") {
        match app {
            AppTag::Chrome => &["chrome.exe"],
            AppTag::Notepad => &["notepad.exe"],
            AppTag::Word => &["WINWORD.EXE"],
            AppTag::Excel => &["EXCEL.EXE"],
            AppTag::PowerPoint => &["POWERPNT.EXE"],
            AppTag::RecycleBin => &[],
        }
    } else if cfg!(target_os = "macos") {
        match app {
            AppTag::Chrome => &["Google Chrome"],
            AppTag::Notepad => &["TextEdit"],
            AppTag::Word => &["Microsoft Word"],
            AppTag::Excel => &["Microsoft Excel"],
            AppTag::PowerPoint => &["Microsoft PowerPoint"],
            AppTag::RecycleBin => &[],
        }
    } else {
        match app {
            AppTag::Chrome => &["chrome", "chromium"],
            AppTag::Notepad => &["gnome-text-editor", "gedit", "kate", "mousepad"],
            AppTag::Word | AppTag::Excel | AppTag::PowerPoint => &["soffice"],
            AppTag::RecycleBin => &[],
        }
    }
}

fn spawn(what: &str, program: impl AsRef<std::ffi::OsStr>, args: &[String]) -> Outcome {
    Command::new(program)
        .args(args)
        .spawn()
        .map(|child| {
            debug!(pid = child.id(), what, "spawned");
            String::new()
        })
        .map_err(|source| AutomationError::Launch {
            what: what.to_string(),
            source,
        })
}

/// Run a command to completion; non-zero exit is an error
fn run_checked(program: &str, args: &[&str]) -> Result<(), AutomationError> {
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|source| AutomationError::Launch {
            what: program.to_string(),
            source,
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(AutomationError::CommandFailed(format!("{} {}", program, status)))
    }
}

// ============================================================================
// Keyboard, mouse and clipboard
// ============================================================================

#[cfg(feature = "desktop")]
mod input {
    use std::thread;
    use std::time::Duration;

    use arboard::Clipboard;
    use enigo::{Axis, Button, Direction, Enigo, Key, Keyboard, Mouse, Settings};

    use crate::automation::{KeyName, MouseButton, ScrollDirection, TabAction};
    use crate::error::AutomationError;

    fn input_err(e: impl std::fmt::Display) -> AutomationError {
        AutomationError::Input(e.to_string())
    }

    /// Cmd on macOS, Ctrl elsewhere
    fn modifier() -> Key {
        #[cfg(target_os = "macos")]
        {
            Key::Meta
        }
        #[cfg(not(target_os = "macos"))]
        {
            Key::Control
        }
    }

    fn key_for(name: KeyName) -> Key {
        match name {
            KeyName::Enter => Key::Return,
            KeyName::Escape => Key::Escape,
            KeyName::Space => Key::Space,
            KeyName::Backspace => Key::Backspace,
        }
    }

    pub struct Keys {
        enigo: Enigo,
        clipboard: Clipboard,
    }

    impl Keys {
        pub fn new() -> Result<Self, AutomationError> {
            let enigo = Enigo::new(&Settings::default()).map_err(input_err)?;
            let clipboard =
                Clipboard::new().map_err(|e| AutomationError::Clipboard(e.to_string()))?;
            Ok(Self { enigo, clipboard })
        }

        fn click(&mut self, key: Key) -> Result<(), AutomationError> {
            self.enigo.key(key, Direction::Click).map_err(input_err)
        }

        /// Hold `modifiers`, click `key`, release in reverse order
        fn chord(&mut self, modifiers: &[Key], key: Key) -> Result<(), AutomationError> {
            for m in modifiers {
                self.enigo.key(*m, Direction::Press).map_err(input_err)?;
            }
            thread::sleep(Duration::from_millis(10));
            self.click(key)?;
            thread::sleep(Duration::from_millis(50));
            for m in modifiers.iter().rev() {
                self.enigo.key(*m, Direction::Release).map_err(input_err)?;
            }
            Ok(())
        }

        fn shortcut(&mut self, letter: char) -> Result<(), AutomationError> {
            self.chord(&[modifier()], Key::Unicode(letter))
        }

        pub fn select_all(&mut self) -> Result<(), AutomationError> {
            self.shortcut('a')
        }

        pub fn delete(&mut self) -> Result<(), AutomationError> {
            self.click(Key::Delete)
        }

        pub fn close_window(&mut self) -> Result<(), AutomationError> {
            #[cfg(target_os = "macos")]
            {
                self.shortcut('w')
            }
            #[cfg(not(target_os = "macos"))]
            {
                self.chord(&[Key::Alt], Key::F4)
            }
        }

        pub fn save(&mut self) -> Result<(), AutomationError> {
            self.shortcut('s')
        }

        pub fn save_as(&mut self, path: &str) -> Result<(), AutomationError> {
            self.chord(&[modifier(), Key::Shift], Key::Unicode('s'))?;
            thread::sleep(Duration::from_millis(500));
            self.text(path)?;
            thread::sleep(Duration::from_millis(200));
            self.click(Key::Return)
        }

        /// Focus the dialog's location bar, switch folder, confirm
        pub fn save_into(&mut self, dir: &str) -> Result<(), AutomationError> {
            self.chord(&[Key::Alt], Key::Unicode('d'))?;
            thread::sleep(Duration::from_millis(300));
            self.text(dir)?;
            thread::sleep(Duration::from_millis(200));
            self.click(Key::Return)?;
            thread::sleep(Duration::from_millis(400));
            self.click(Key::Return)
        }

        pub fn new_document(&mut self) -> Result<(), AutomationError> {
            self.shortcut('n')
        }

        pub fn new_slide(&mut self) -> Result<(), AutomationError> {
            self.shortcut('m')
        }

        pub fn press(&mut self, name: KeyName, times: u32) -> Result<(), AutomationError> {
            for _ in 0..times {
                self.click(key_for(name))?;
                thread::sleep(Duration::from_millis(20));
            }
            Ok(())
        }

        pub fn text(&mut self, text: &str) -> Result<(), AutomationError> {
            if text.is_empty() {
                return Ok(());
            }
            self.enigo.text(text).map_err(input_err)
        }

        /// Paste through the clipboard so any script survives
        fn paste(&mut self, text: &str) -> Result<(), AutomationError> {
            self.clipboard
                .set_text(text)
                .map_err(|e| AutomationError::Clipboard(e.to_string()))?;
            thread::sleep(Duration::from_millis(50));
            self.shortcut('v')
        }

        pub fn scroll(&mut self, direction: ScrollDirection, amount: i32) -> Result<(), AutomationError> {
            let length = match direction {
                ScrollDirection::Down => amount,
                ScrollDirection::Up => -amount,
            };
            self.enigo.scroll(length, Axis::Vertical).map_err(input_err)
        }

        pub fn mouse(&mut self, button: MouseButton) -> Result<(), AutomationError> {
            let button = match button {
                MouseButton::Left => Button::Left,
                MouseButton::Right => Button::Right,
            };
            self.enigo.button(button, Direction::Click).map_err(input_err)
        }

        pub fn tab(&mut self, action: TabAction) -> Result<(), AutomationError> {
            match action {
                TabAction::New => self.shortcut('t'),
                TabAction::Close => self.shortcut('w'),
                TabAction::Next => self.chord(&[Key::Control], Key::Tab),
                TabAction::Previous => self.chord(&[Key::Control, Key::Shift], Key::Tab),
            }
        }

        pub fn browser_address(&mut self, text: &str) -> Result<(), AutomationError> {
            self.shortcut('l')?;
            thread::sleep(Duration::from_millis(100));
            self.paste(text)?;
            thread::sleep(Duration::from_millis(100));
            self.click(Key::Return)
        }

        pub fn spreadsheet_rows(&mut self, rows: &[Vec<String>]) -> Result<(), AutomationError> {
            for row in rows {
                for (i, cell) in row.iter().enumerate() {
                    self.text(cell)?;
                    if i + 1 < row.len() {
                        self.click(Key::Tab)?;
                    }
                }
                self.click(Key::Return)?;
                thread::sleep(Duration::from_millis(50));
            }
            Ok(())
        }

        /// Copy the selection and read it back from the clipboard
        pub fn copy_selection(&mut self) -> Result<String, AutomationError> {
            self.shortcut('c')?;
            thread::sleep(Duration::from_millis(150));
            Ok(self.clipboard.get_text().unwrap_or_default().trim().to_string())
        }
    }
}

#[cfg(not(feature = "desktop"))]
mod input {
    use crate::automation::{KeyName, MouseButton, ScrollDirection, TabAction};
    use crate::error::AutomationError;

    const UNSUPPORTED: &str = "Keyboard and mouse control";

    /// Placeholder used when the crate is built without `desktop`
    pub struct Keys;

    impl Keys {
        pub fn new() -> Result<Self, AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }

        pub fn select_all(&mut self) -> Result<(), AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }
        pub fn delete(&mut self) -> Result<(), AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }
        pub fn close_window(&mut self) -> Result<(), AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }
        pub fn save(&mut self) -> Result<(), AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }
        pub fn save_as(&mut self, _path: &str) -> Result<(), AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }
        pub fn save_into(&mut self, _dir: &str) -> Result<(), AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }
        pub fn new_document(&mut self) -> Result<(), AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }
        pub fn new_slide(&mut self) -> Result<(), AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }
        pub fn press(&mut self, _name: KeyName, _times: u32) -> Result<(), AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }
        pub fn text(&mut self, _text: &str) -> Result<(), AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }
        pub fn scroll(&mut self, _d: ScrollDirection, _amount: i32) -> Result<(), AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }
        pub fn mouse(&mut self, _button: MouseButton) -> Result<(), AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }
        pub fn tab(&mut self, _action: TabAction) -> Result<(), AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }
        pub fn browser_address(&mut self, _text: &str) -> Result<(), AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }
        pub fn spreadsheet_rows(&mut self, _rows: &[Vec<String>]) -> Result<(), AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }
        pub fn copy_selection(&mut self) -> Result<String, AutomationError> {
            Err(AutomationError::Unsupported(UNSUPPORTED))
        }
    }
}

use input::Keys;

// ============================================================================
// DesktopAutomation
// ============================================================================

/// Drives the local desktop
pub struct DesktopAutomation {
    /// Created on first keyboard/mouse use so launch-only sessions never need it
    keys: Option<Keys>,
}

impl DesktopAutomation {
    pub fn new() -> Self {
        Self { keys: None }
    }

    fn keys(&mut self) -> Result<&mut Keys, AutomationError> {
        if self.keys.is_none() {
            self.keys = Some(Keys::new()?);
        }
        self.keys
            .as_mut()
            .ok_or(AutomationError::Unsupported("Keyboard and mouse control"))
    }

    fn launch_app(&mut self, app: AppTag, profile: Option<&str>) -> Outcome {
        if app == AppTag::RecycleBin {
            return self.run_primitive(Primitive::OpenRecycleBin);
        }

        let mut extra = Vec::new();
        if let Some(profile) = profile {
            extra.push(format!("--profile-directory={}", profile));
        }

        #[cfg(target_os = "macos")]
        if let Some(bundle) = mac_bundle(app) {
            let mut args = vec!["-a".to_string(), bundle.to_string()];
            if !extra.is_empty() {
                args.push("--args".to_string());
                args.extend(extra.iter().cloned());
            }
            if spawn(app.display_name(), "open", &args).is_ok() {
                return Ok(opened_message(app, profile));
            }
        }

        for (program, fixed) in candidates(app) {
            if let Ok(path) = which::which(program) {
                let args: Vec<String> = fixed
                    .iter()
                    .map(|a| a.to_string())
                    .chain(extra.iter().cloned())
                    .collect();
                spawn(app.display_name(), &path, &args)?;
                return Ok(opened_message(app, profile));
            }
        }

        for path in known_paths(app) {
            if path.exists() {
                spawn(app.display_name(), &path, &extra)?;
                return Ok(opened_message(app, profile));
            }
        }

        if cfg!(target_os = "windows") {
            if let Some((program, _)) = candidates(app).first() {
                let mut args = vec!["/C".to_string(), "start".to_string(), String::new()];
                args.push(program.to_string());
                args.extend(extra);
                spawn(app.display_name(), "cmd", &args)?;
                return Ok(opened_message(app, profile));
            }
        }

        Err(AutomationError::NotFound(app.display_name().to_string()))
    }

    fn close_app(&mut self, app: AppTag) -> Result<(), AutomationError> {
        let mut closed = false;
        for name in process_names(app) {
            let result = if cfg!(target_os = "windows") {
                run_checked("taskkill", &["/IM", name, "/F"])
            } else if cfg!(target_os = "macos") {
                run_checked("pkill", &["-x", name])
            } else {
                run_checked("pkill", &["-f", name])
            };
            match result {
                Ok(()) => closed = true,
                Err(e) => debug!(process = name, error = %e, "close attempt failed"),
            }
        }
        if closed {
            Ok(())
        } else {
            Err(AutomationError::NotRunning(app.display_name().to_string()))
        }
    }

    fn power(&mut self, action: PowerAction) -> Result<(), AutomationError> {
        warn!(?action, "executing system power action");
        if cfg!(target_os = "windows") {
            match action {
                PowerAction::Shutdown => run_checked("shutdown", &["/s", "/t", "5"]),
                PowerAction::Restart => run_checked("shutdown", &["/r", "/t", "5"]),
                PowerAction::Sleep => {
                    run_checked("rundll32.exe", &["powrprof.dll,SetSuspendState", "0,1,0"])
                }
            }
        } else if cfg!(target_os = "macos") {
            match action {
                PowerAction::Shutdown => run_checked(
                    "osascript",
                    &["-e", "tell app \"System Events\" to shut down"],
                ),
                PowerAction::Restart => run_checked(
                    "osascript",
                    &["-e", "tell app \"System Events\" to restart"],
                ),
                PowerAction::Sleep => run_checked("pmset", &["sleepnow"]),
            }
        } else {
            match action {
                PowerAction::Shutdown => run_checked("systemctl", &["poweroff"]),
                PowerAction::Restart => run_checked("systemctl", &["reboot"]),
                PowerAction::Sleep => run_checked("systemctl", &["suspend"]),
            }
        }
    }

    fn open_recycle_bin(&mut self) -> Result<(), AutomationError> {
        if cfg!(target_os = "windows") {
            spawn("Recycle Bin", "explorer", &["shell:RecycleBinFolder".to_string()])?;
            Ok(())
        } else if cfg!(target_os = "macos") {
            let trash = dirs::home_dir()
                .map(|h| h.join(".Trash"))
                .ok_or_else(|| AutomationError::NotFound("Trash".into()))?;
            open::that(trash)?;
            Ok(())
        } else {
            open::that("trash:///")?;
            Ok(())
        }
    }

    #[hotpath::measure]
    fn run_primitive(&mut self, primitive: Primitive) -> Outcome {
        let message = primitive.describe();
        match &primitive {
            Primitive::SelectAll => self.keys()?.select_all()?,
            Primitive::DeleteSelection => self.keys()?.delete()?,
            Primitive::CloseActiveWindow => self.keys()?.close_window()?,
            Primitive::TypeText(text) => self.keys()?.text(text)?,
            Primitive::Save => self.keys()?.save()?,
            Primitive::SaveAs(path) => {
                ensure_parent(path)?;
                self.keys()?.save_as(&path.to_string_lossy())?
            }
            Primitive::SaveInto(dir) => {
                std::fs::create_dir_all(dir)?;
                self.keys()?.save_into(&dir.to_string_lossy())?
            }
            Primitive::NewDocument => self.keys()?.new_document()?,
            Primitive::NewSlide => self.keys()?.new_slide()?,
            Primitive::PressKey { key, times } => self.keys()?.press(*key, *times)?,
            Primitive::Scroll { direction, amount } => self.keys()?.scroll(*direction, *amount)?,
            Primitive::Click(button) => self.keys()?.mouse(*button)?,
            Primitive::Tab(action) => self.keys()?.tab(*action)?,
            Primitive::BrowserAddress(text) => self.keys()?.browser_address(text)?,
            Primitive::FillTable { layout, rows } => match layout {
                super::TableLayout::Spreadsheet => self.keys()?.spreadsheet_rows(rows)?,
                super::TableLayout::Document => {
                    let block = rows
                        .iter()
                        .map(|r| r.join("\t"))
                        .collect::<Vec<_>>()
                        .join("\n");
                    self.keys()?.text(&block)?
                }
            },
            Primitive::OpenUrl(url) => open::that(url)?,
            Primitive::OpenPath(path) => {
                if !path.exists() {
                    return Ok(format!(
                        "I couldn't find this path on your computer: {}",
                        path.display()
                    ));
                }
                open::that(path)?
            }
            Primitive::OpenRecycleBin => self.open_recycle_bin()?,
            Primitive::CreateFolder(path) => std::fs::create_dir_all(path)?,
            Primitive::CloseApp(app) => self.close_app(*app)?,
            Primitive::Power(action) => self.power(*action)?,
        }
        Ok(message)
    }
}

impl Default for DesktopAutomation {
    fn default() -> Self {
        Self::new()
    }
}

fn opened_message(app: AppTag, profile: Option<&str>) -> String {
    match (app, profile) {
        (AppTag::Chrome, Some(profile)) => format!("Opening Chrome with profile {}", profile),
        (AppTag::Chrome, None) => "Opening Google Chrome".to_string(),
        (app, _) => format!("Opening {}", app),
    }
}

fn ensure_parent(path: &Path) -> Result<(), AutomationError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

impl Automation for DesktopAutomation {
    fn launch(&mut self, app: AppTag, profile: Option<&str>) -> Outcome {
        info!(%app, ?profile, "launching");
        self.launch_app(app, profile)
    }

    fn run(&mut self, primitive: Primitive) -> Outcome {
        debug!(%primitive, "running primitive");
        let result = self.run_primitive(primitive);
        if let Err(e) = &result {
            warn!(error = %e, "primitive failed");
        }
        // Give the focused app a moment before the next command lands
        thread::sleep(Duration::from_millis(30));
        result
    }

    fn selected_text(&mut self) -> Result<String, AutomationError> {
        self.keys()?.copy_selection()
    }

    fn name(&self) -> &str {
        "desktop"
    }
}
