use std::fmt;

use crate::dataset::Label;
use crate::detector::SpamDetector;

/// Anything that can label a message. The form only needs this much.
pub trait Classify {
    fn predict_label(&self, text: &str) -> Label;
}

impl Classify for SpamDetector {
    fn predict_label(&self, text: &str) -> Label {
        SpamDetector::predict_label(self, text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Idle,
    ShowingResult(Label),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    Input(String),
    Check,
    Clear,
}

/// What the front-end has to render after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    WarnInputRequired,
    ShowResult(Label),
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeStyle {
    Neutral,
    Danger,
    Safe,
}

/// Rendered result indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub text: &'static str,
    pub icon: &'static str,
    pub style: BadgeStyle,
}

impl Badge {
    pub fn for_state(state: FormState) -> Badge {
        match state {
            FormState::Idle => Badge {
                text: "",
                icon: "",
                style: BadgeStyle::Neutral,
            },
            FormState::ShowingResult(Label::Spam) => Badge {
                text: "SPAM",
                icon: "⚠️",
                style: BadgeStyle::Danger,
            },
            FormState::ShowingResult(Label::Ham) => Badge {
                text: "HAM",
                icon: "✅",
                style: BadgeStyle::Safe,
            },
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.style {
            BadgeStyle::Neutral => Ok(()),
            BadgeStyle::Danger => write!(f, "\x1b[1;31m{} {}\x1b[0m", self.icon, self.text),
            BadgeStyle::Safe => write!(f, "\x1b[1;32m{} {}\x1b[0m", self.icon, self.text),
        }
    }
}

/// Message form holding the input buffer and the shown result.
pub struct Form<C> {
    classifier: C,
    input: String,
    state: FormState,
}

impl<C: Classify> Form<C> {
    pub fn new(classifier: C) -> Self {
        Form {
            classifier,
            input: String::new(),
            state: FormState::Idle,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn badge(&self) -> Badge {
        Badge::for_state(self.state)
    }

    pub fn handle(&mut self, event: FormEvent) -> Effect {
        match event {
            FormEvent::Input(text) => {
                self.input = text;
                Effect::None
            }
            FormEvent::Check => {
                let text = self.input.trim();
                if text.is_empty() {
                    return Effect::WarnInputRequired;
                }
                let label = self.classifier.predict_label(text);
                self.state = FormState::ShowingResult(label);
                Effect::ShowResult(label)
            }
            FormEvent::Clear => {
                self.input.clear();
                self.state = FormState::Idle;
                Effect::Cleared
            }
        }
    }
}
