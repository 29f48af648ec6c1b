//! Headless HUD model: command draft composition, feedback, suggestions,
//! the paywall, and the speech-input capability surface. Rendering is
//! someone else's job; every observable lives here as plain state.

use engine::{EventBus, GameEvent, StorageError, SubscriptionStore, Verb};
use tracing::{debug, info};

const SPEECH_UNAVAILABLE_MESSAGE: &str = "Speech recognition is not available";
const PAYWALL_LEVEL: u32 = 3;

/// Success/failure banner shown after a submitted command.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub success: bool,
    pub message: String,
}

/// Speech capture capability. The shipped build has none; the trait is the
/// seam a platform integration would fill.
pub trait SpeechInput {
    fn is_available(&self) -> bool;
    fn capture(&mut self) -> Option<String>;
}

/// Always-absent speech input.
#[derive(Debug, Default)]
pub struct UnavailableSpeech;

impl SpeechInput for UnavailableSpeech {
    fn is_available(&self) -> bool {
        false
    }

    fn capture(&mut self) -> Option<String> {
        None
    }
}

pub struct Hud {
    bus: EventBus,
    draft: String,
    suggestions: Vec<String>,
    feedback: Option<Feedback>,
    paywall_open: bool,
    speech: Box<dyn SpeechInput>,
    speech_warned: bool,
}

impl Hud {
    pub fn new(bus: EventBus, speech: Box<dyn SpeechInput>) -> Self {
        Self {
            bus,
            draft: String::new(),
            suggestions: vec!["go to tree".to_string()],
            feedback: None,
            paywall_open: false,
            speech,
            speech_warned: false,
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn take_feedback(&mut self) -> Option<Feedback> {
        self.feedback.take()
    }

    pub fn is_paywall_open(&self) -> bool {
        self.paywall_open
    }

    /// Publishes the draft (or the given line) as a command. Blank input
    /// is ignored; the draft is cleared on submit.
    pub fn submit(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        debug!(command = %text, "command submitted");
        self.bus.publish(GameEvent::CommandSubmitted {
            command: text.to_string(),
        });
        self.draft.clear();
    }

    /// A clicked object lands in the draft: appended when the draft is a
    /// lone verb, otherwise it becomes the draft.
    pub fn object_clicked(&mut self, object_name: &str) {
        let words: Vec<&str> = self.draft.split_whitespace().collect();
        if words.len() == 1 && Verb::from_token(&words[0].to_lowercase()).is_some() {
            self.draft = format!("{} {object_name}", words[0]);
        } else {
            self.draft = object_name.to_string();
        }
    }

    /// A clicked verb button: prepended when the draft is a lone non-verb,
    /// otherwise it becomes the draft.
    pub fn verb_clicked(&mut self, verb: Verb) {
        let words: Vec<&str> = self.draft.split_whitespace().collect();
        if words.len() == 1 && Verb::from_token(&words[0].to_lowercase()).is_none() {
            self.draft = format!("{} {}", verb.as_str(), words[0]);
        } else {
            self.draft = verb.as_str().to_string();
        }
    }

    pub fn on_level_complete(&mut self, level: u32, subscribed: bool) {
        if level == PAYWALL_LEVEL && !subscribed {
            info!("paywall opened");
            self.paywall_open = true;
        }
    }

    /// Persists the flag, closes the paywall, and announces the purchase.
    pub fn subscribe(&mut self, store: &SubscriptionStore) -> Result<(), StorageError> {
        store.set_subscribed(true)?;
        self.paywall_open = false;
        self.bus.publish(GameEvent::UserSubscribed);
        Ok(())
    }

    pub fn dismiss_paywall(&mut self) {
        self.paywall_open = false;
    }

    /// Attempts a speech capture. With no capability present, surfaces the
    /// unavailability message once and stays quiet afterwards.
    pub fn toggle_mic(&mut self) -> Option<String> {
        if self.speech.is_available() {
            return self.speech.capture();
        }
        if !self.speech_warned {
            self.speech_warned = true;
            self.feedback = Some(Feedback {
                success: false,
                message: SPEECH_UNAVAILABLE_MESSAGE.to_string(),
            });
        }
        None
    }
}
