//! Confirmation gate for irreversible system actions
//!
//! A power phrase never runs immediately. The router reports it, the gate
//! stores it, and the next turn decides:
//!
//! ```text
//! Idle --power phrase--> Awaiting(kind)          prompt, nothing executed
//! Awaiting(kind) --yes--> Idle                   execute kind once
//! Awaiting(kind) --no---> Idle                   cancelled
//! Awaiting(kind) --other-> Awaiting(kind)        re-prompt naming kind
//! ```

use std::fmt;

use tracing::info;

use crate::utterance::Utterance;

/// Irreversible system actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Shutdown,
    Restart,
    Sleep,
}

impl PowerAction {
    pub fn label(self) -> &'static str {
        match self {
            PowerAction::Shutdown => "shutdown",
            PowerAction::Restart => "restart",
            PowerAction::Sleep => "sleep",
        }
    }

    /// Question asked when the action is first requested
    pub fn prompt(self) -> &'static str {
        match self {
            PowerAction::Shutdown => {
                "Do you really want to shut down the system? Please say 'yes' or 'no'."
            }
            PowerAction::Restart => {
                "Should I restart the system? Say 'yes' to restart or 'no' to cancel."
            }
            PowerAction::Sleep => {
                "Should I put the system to sleep? Please confirm with 'yes' or 'no'."
            }
        }
    }

    /// Spoken once the action has been handed to the OS
    pub fn completion(self) -> &'static str {
        match self {
            PowerAction::Shutdown => "Shutting down the system now.",
            PowerAction::Restart => "Restarting the system now.",
            PowerAction::Sleep => "Putting the system to sleep now.",
        }
    }

    pub fn reprompt(self) -> String {
        format!(
            "You requested a {} action. Please confirm by saying 'yes' to proceed or 'no' to cancel.",
            self.label()
        )
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub const POSITIVE_REPLIES: &[&str] = &[
    "yes", "ok", "okay", "confirm", "proceed", "go ahead", "sure", "yep",
];

pub const NEGATIVE_REPLIES: &[&str] = &[
    "no", "cancel", "abort", "stop", "don't", "do not", "nope",
];

/// Classification of a reply to a yes/no question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Positive,
    Negative,
    Unclear,
}

/// Keyword test; positive wins when both appear
pub fn classify(utterance: &Utterance) -> Reply {
    if utterance.has_any(POSITIVE_REPLIES) {
        Reply::Positive
    } else if utterance.has_any(NEGATIVE_REPLIES) {
        Reply::Negative
    } else {
        Reply::Unclear
    }
}

/// What the orchestrator should do with a turn the gate consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Execute(PowerAction),
    Cancelled(PowerAction),
    Reprompt(PowerAction),
}

impl Decision {
    /// Response text for decisions that do not run anything
    pub fn message(&self) -> String {
        match self {
            Decision::Execute(kind) => kind.completion().to_string(),
            Decision::Cancelled(_) => "System action cancelled. No changes made.".to_string(),
            Decision::Reprompt(kind) => kind.reprompt(),
        }
    }
}

/// Holds at most one pending power action
#[derive(Debug, Default)]
pub struct ConfirmationGate {
    pending: Option<PowerAction>,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<PowerAction> {
        self.pending
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Idle -> Awaiting(kind); returns the question to ask
    pub fn request(&mut self, kind: PowerAction) -> &'static str {
        info!(%kind, "awaiting confirmation");
        self.pending = Some(kind);
        kind.prompt()
    }

    /// Consume a turn while awaiting; `None` when idle
    pub fn resolve(&mut self, utterance: &Utterance) -> Option<Decision> {
        let kind = self.pending?;
        let decision = match classify(utterance) {
            Reply::Positive => {
                self.pending = None;
                Decision::Execute(kind)
            }
            Reply::Negative => {
                self.pending = None;
                Decision::Cancelled(kind)
            }
            Reply::Unclear => Decision::Reprompt(kind),
        };
        info!(?decision, "confirmation resolved");
        Some(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(text: &str) -> Utterance {
        Utterance::new(text)
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&u("yes please")), Reply::Positive);
        assert_eq!(classify(&u("Go ahead")), Reply::Positive);
        assert_eq!(classify(&u("nope")), Reply::Negative);
        assert_eq!(classify(&u("do not do that")), Reply::Negative);
        assert_eq!(classify(&u("what time is it")), Reply::Unclear);
        // Word boundaries: "notepad" is not "no", "yesterday" is not "yes"
        assert_eq!(classify(&u("open notepad")), Reply::Unclear);
        assert_eq!(classify(&u("yesterday")), Reply::Unclear);
    }

    #[test]
    fn test_idle_gate_ignores_turns() {
        let mut gate = ConfirmationGate::new();
        assert_eq!(gate.resolve(&u("yes")), None);
        assert_eq!(gate.resolve(&u("no")), None);
        assert!(gate.is_idle());
    }

    #[test]
    fn test_confirm_executes_once() {
        let mut gate = ConfirmationGate::new();
        gate.request(PowerAction::Restart);
        assert_eq!(gate.pending(), Some(PowerAction::Restart));

        assert_eq!(
            gate.resolve(&u("yes")),
            Some(Decision::Execute(PowerAction::Restart))
        );
        assert!(gate.is_idle());
        assert_eq!(gate.resolve(&u("yes")), None);
    }

    #[test]
    fn test_unclear_reply_keeps_waiting() {
        let mut gate = ConfirmationGate::new();
        gate.request(PowerAction::Sleep);

        let decision = gate.resolve(&u("what was that")).unwrap();
        assert_eq!(decision, Decision::Reprompt(PowerAction::Sleep));
        assert!(decision.message().contains("sleep"));
        assert_eq!(gate.pending(), Some(PowerAction::Sleep));

        assert_eq!(
            gate.resolve(&u("cancel")),
            Some(Decision::Cancelled(PowerAction::Sleep))
        );
        assert!(gate.is_idle());
    }

    #[test]
    fn test_second_power_phrase_reprompts_first() {
        let mut gate = ConfirmationGate::new();
        gate.request(PowerAction::Shutdown);
        assert_eq!(
            gate.resolve(&u("restart")),
            Some(Decision::Reprompt(PowerAction::Shutdown))
        );
        assert_eq!(gate.pending(), Some(PowerAction::Shutdown));
    }
}
