//! The per-utterance pipeline
//!
//! Each turn runs, short-circuiting at the first step that produces a reply:
//!
//! 1. mute / unmute phrases (these bypass everything, including a pending confirmation)
//! 2. a pending power action consumes the turn as a yes/no answer
//! 3. the intent router
//! 4. the web-search heuristic
//! 5. the chat backend, with the recent history as context
//!
//! The reply is appended to the history and spoken. Everything here runs on the
//! caller's thread; only speech playback is handed off.

use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::automation::{Automation, Primitive};
use crate::chat::{self, ChatBackend, Message};
use crate::config::{ChatConfig, Config};
use crate::confirmation::{ConfirmationGate, Decision, PowerAction};
use crate::context::SessionContext;
use crate::history::ConversationHistory;
use crate::router::{RouteResult, Router, RouterSettings, google_search_url};
use crate::speech::{Speaker, Voice};
use crate::ui::Status;
use crate::utterance::Utterance;

const MUTED_REPLY: &str = "Okay, I'll stay quiet until you say 'speak'.";
const UNMUTED_REPLY: &str = "Voice output is back on. I'll speak my responses again.";
const NO_CHAT_REPLY: &str = "I didn't recognize that as a command, and chat is turned off.";

/// Which step produced the reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    VoiceControl,
    Confirmation,
    Command,
    Search,
    Chat,
}

/// Result of one handled utterance
#[derive(Debug)]
pub struct Turn {
    pub response: String,
    pub source: Source,
    /// Playback thread, when the reply is being spoken
    pub speech: Option<JoinHandle<()>>,
}

struct Phrases {
    mute: Vec<String>,
    unmute: Vec<String>,
    search_indicators: Vec<String>,
    authoring_verbs: Vec<String>,
}

fn lowered(list: &[String]) -> Vec<String> {
    list.iter().map(|s| s.trim().to_lowercase()).collect()
}

fn has_any(u: &Utterance, phrases: &[String]) -> bool {
    phrases.iter().any(|p| u.has(p))
}

pub struct Assistant<A: Automation> {
    name: String,
    router: Router,
    context: SessionContext,
    gate: ConfirmationGate,
    history: ConversationHistory,
    automation: A,
    chat: Option<Box<dyn ChatBackend>>,
    max_tokens: u32,
    history_turns: usize,
    voice: Voice,
    phrases: Phrases,
    idle: Status,
}

impl<A: Automation> Assistant<A> {
    pub fn new(
        config: &Config,
        automation: A,
        chat: Option<Box<dyn ChatBackend>>,
        speaker: Arc<dyn Speaker>,
    ) -> Self {
        let (max_tokens, history_turns) = match &config.chat {
            ChatConfig::OpenAiCompat {
                max_tokens,
                history_turns,
                ..
            } => (*max_tokens, *history_turns),
            ChatConfig::Disabled => (0, 0),
        };
        Self {
            name: config.name.clone(),
            router: Router::new(RouterSettings::from(&config.automation)),
            context: SessionContext::new(),
            gate: ConfirmationGate::new(),
            history: ConversationHistory::new(config.history_entries),
            automation,
            chat,
            max_tokens,
            history_turns,
            voice: Voice::new(speaker),
            phrases: Phrases {
                mute: lowered(&config.commands.mute_phrases),
                unmute: lowered(&config.commands.unmute_phrases),
                search_indicators: lowered(&config.commands.search_indicators),
                authoring_verbs: lowered(&config.commands.authoring_verbs),
            },
            idle: Status::Ready,
        }
    }

    /// Swap the router (tests point it at a scratch home directory)
    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Status reported once a turn is done
    pub fn set_idle_status(&mut self, status: Status) {
        self.idle = status;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn pending_action(&self) -> Option<PowerAction> {
        self.gate.pending()
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn voice(&self) -> &Voice {
        &self.voice
    }

    pub fn automation(&self) -> &A {
        &self.automation
    }

    pub fn automation_mut(&mut self) -> &mut A {
        &mut self.automation
    }

    /// Run one utterance through the pipeline; `None` for blank input
    pub fn handle(&mut self, text: &str, on_status: &mut dyn FnMut(Status)) -> Option<Turn> {
        let utterance = Utterance::new(text);
        if utterance.is_empty() {
            return None;
        }
        on_status(Status::Processing);
        self.history.push_user(utterance.raw());

        let (response, source) = self.respond(&utterance, on_status);
        info!(?source, response = %response, "turn handled");

        self.history.push_assistant(response.clone());
        on_status(Status::Responding);
        let speech = self.voice.speak(&response);
        on_status(self.idle.clone());

        Some(Turn {
            response,
            source,
            speech,
        })
    }

    fn respond(&mut self, u: &Utterance, on_status: &mut dyn FnMut(Status)) -> (String, Source) {
        if has_any(u, &self.phrases.mute) {
            self.voice.mute();
            return (MUTED_REPLY.to_string(), Source::VoiceControl);
        }
        if has_any(u, &self.phrases.unmute) {
            self.voice.unmute();
            return (UNMUTED_REPLY.to_string(), Source::VoiceControl);
        }

        if let Some(decision) = self.gate.resolve(u) {
            return (self.apply_decision(decision), Source::Confirmation);
        }

        let routed = self.router.route(u, &self.context, &mut self.automation);
        self.context = routed.context;
        match routed.result {
            RouteResult::Handled(text) => return (text, Source::Command),
            RouteResult::SystemActionRequested(kind) => {
                return (self.gate.request(kind).to_string(), Source::Confirmation);
            }
            RouteResult::Unhandled => {}
        }

        if let Some(query) = self.search_query(u) {
            return (self.web_search(&query), Source::Search);
        }

        on_status(Status::Thinking);
        (self.converse(u), Source::Chat)
    }

    fn apply_decision(&mut self, decision: Decision) -> String {
        match decision {
            Decision::Execute(kind) => match self.automation.run(Primitive::Power(kind)) {
                Ok(outcome) => {
                    debug!(%outcome, "power action started");
                    decision.message()
                }
                Err(e) => {
                    warn!(error = %e, %kind, "power action failed");
                    format!("Sorry, I couldn't {} the computer. {}", kind.label(), e)
                }
            },
            Decision::Cancelled(_) | Decision::Reprompt(_) => decision.message(),
        }
    }

    /// Query for the web-search fallback: the text after a search-indicator
    /// phrase, or a whole longer question. `None` leaves the turn to chat.
    fn search_query(&self, u: &Utterance) -> Option<String> {
        let raw = match self.phrases.search_indicators.iter().find(|p| u.has(p)) {
            Some(indicator) => u.raw_after(indicator)?,
            None if u.word_count() > 2 && u.raw().contains('?') => u.raw(),
            None => return None,
        };
        let query = raw.trim_end_matches(['?', '.', '!']).trim();
        (!query.is_empty()).then(|| query.to_string())
    }

    fn web_search(&mut self, query: &str) -> String {
        match self
            .automation
            .run(Primitive::OpenUrl(google_search_url(query)))
        {
            Ok(_) => format!("Opening Google search for: {}", query),
            Err(e) => {
                warn!(error = %e, "search fallback failed");
                format!("Sorry, I couldn't open Google search. {}", e)
            }
        }
    }

    fn converse(&mut self, u: &Utterance) -> String {
        let Some(backend) = self.chat.as_mut() else {
            return NO_CHAT_REPLY.to_string();
        };

        let mut messages = vec![Message::system(chat::system_prompt(&self.name))];
        messages.extend(self.history.tail_messages(self.history_turns));
        debug!(backend = backend.name(), messages = messages.len(), "chat request");

        let reply = match backend.converse(&messages, self.max_tokens) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "chat failed");
                return format!("Sorry, I couldn't reach the chat service. {}", e);
            }
        };

        if has_any(u, &self.phrases.authoring_verbs) {
            if let Err(e) = self.automation.run(Primitive::TypeText(reply.clone())) {
                warn!(error = %e, "could not type the reply");
            }
        }
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::RecordingAutomation;
    use crate::chat::ScriptedBackend;
    use crate::speech::RecordingSpeaker;

    fn assistant(chat: Option<ScriptedBackend>) -> Assistant<RecordingAutomation> {
        let config = Config::default();
        Assistant::new(
            &config,
            RecordingAutomation::new(),
            chat.map(|c| Box::new(c) as Box<dyn ChatBackend>),
            Arc::new(RecordingSpeaker::new()),
        )
    }

    fn say(a: &mut Assistant<RecordingAutomation>, text: &str) -> Turn {
        a.handle(text, &mut |_| {}).unwrap()
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut a = assistant(None);
        assert!(a.handle("   ", &mut |_| {}).is_none());
        assert!(a.history().is_empty());
    }

    #[test]
    fn test_mute_bypasses_pending_confirmation() {
        let mut a = assistant(None);
        say(&mut a, "shutdown");
        let turn = say(&mut a, "stop");

        assert_eq!(turn.source, Source::VoiceControl);
        assert!(turn.speech.is_none());
        assert!(a.voice().is_muted());
        assert_eq!(a.pending_action(), Some(PowerAction::Shutdown));

        let turn = say(&mut a, "speak");
        assert!(!a.voice().is_muted());
        assert_eq!(turn.response, UNMUTED_REPLY);
    }

    #[test]
    fn test_question_goes_to_search() {
        let mut a = assistant(Some(ScriptedBackend::new().reply("unused")));
        let turn = say(&mut a, "how tall is mount everest?");
        assert_eq!(turn.source, Source::Search);
        assert_eq!(
            turn.response,
            "Opening Google search for: how tall is mount everest"
        );
    }

    #[test]
    fn test_search_indicator_is_dropped_from_query() {
        let mut a = assistant(None);
        let turn = say(&mut a, "What is the Rust borrow checker?");
        assert_eq!(turn.source, Source::Search);
        assert_eq!(
            turn.response,
            "Opening Google search for: the Rust borrow checker"
        );
        assert_eq!(
            a.automation().primitives(),
            vec![&Primitive::OpenUrl(google_search_url("the Rust borrow checker"))]
        );

        let turn = say(&mut a, "tell me about");
        assert_eq!(turn.source, Source::Chat);
        assert_eq!(turn.response, NO_CHAT_REPLY);
    }

    #[test]
    fn test_chat_reply_is_typed_for_authoring_verbs() {
        let mut a = assistant(Some(
            ScriptedBackend::new().reply("Rust is a systems language."),
        ));
        let turn = say(&mut a, "write a short note about rust");

        assert_eq!(turn.source, Source::Chat);
        assert_eq!(turn.response, "Rust is a systems language.");
        assert_eq!(
            a.automation().primitives(),
            vec![&Primitive::TypeText("Rust is a systems language.".into())]
        );
    }

    #[test]
    fn test_chat_failure_is_spoken() {
        let mut a = assistant(Some(ScriptedBackend::new().fail("connection refused")));
        let turn = say(&mut a, "tell me a joke");
        assert_eq!(turn.source, Source::Chat);
        assert!(turn.response.starts_with("Sorry, I couldn't reach the chat service."));
    }

    #[test]
    fn test_status_sequence_for_chat_turn() {
        let mut a = assistant(Some(ScriptedBackend::new().reply("Hello!")));
        let mut seen = Vec::new();
        a.handle("good morning", &mut |s| seen.push(s));
        assert_eq!(
            seen,
            vec![
                Status::Processing,
                Status::Thinking,
                Status::Responding,
                Status::Ready
            ]
        );
    }

    #[test]
    fn test_history_records_both_sides() {
        let mut a = assistant(None);
        say(&mut a, "open notepad");
        let roles: Vec<_> = a.history().iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![chat::Role::User, chat::Role::Assistant]);
    }
}
