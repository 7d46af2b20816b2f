use std::collections::VecDeque;
use std::time::{Duration, Instant};
use derive_more::with_trait::Display;
use crate::modules::error::EditError;
use crate::modules::forms::FormState;

/// How long a notification stays up, fade included.
pub const NOTIFICATION_LIFETIME: Duration = Duration::from_millis(3500);

#[derive(Debug, Clone, Copy, Display, PartialEq, Eq)]
pub enum Level {
    #[display("success")]
    Success,
    #[display("error")]
    Error,
}

#[derive(Debug, Clone, Display, PartialEq, Eq)]
#[display("[{level}] {message}")]
pub struct Notification {
    pub level: Level,
    pub message: String,
    pub raised_at: Instant,
}

/// Dialog contents while a modal is open.
#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    Video { element: usize, url: String },
    Link { element: usize, url: String, text: String },
    Json { element: usize, form: FormState },
}

impl Modal {
    pub fn element(&self) -> usize {
        match self {
            Modal::Video { element, .. } | Modal::Link { element, .. } | Modal::Json { element, .. } => *element,
        }
    }
}

/// Owns everything on screen that is not an editable element: the
/// notification queue, the one modal slot, the inline validation message
/// and the pending page reload.
#[derive(Debug, Default)]
pub struct UiState {
    notifications: VecDeque<Notification>,
    modal: Option<Modal>,
    validation: Option<String>,
    reload_requested: bool,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&mut self, level: Level, message: impl Into<String>) {
        self.notify_at(level, message, Instant::now());
    }

    pub fn notify_at(&mut self, level: Level, message: impl Into<String>, now: Instant) {
        self.notifications.push_back(Notification {
            level,
            message: message.into(),
            raised_at: now,
        });
    }

    /// Drops expired notifications and returns the ones still showing.
    pub fn visible(&mut self, now: Instant) -> impl Iterator<Item = &Notification> {
        self.notifications
            .retain(|n| now.saturating_duration_since(n.raised_at) < NOTIFICATION_LIFETIME);
        self.notifications.iter()
    }

    /// Raised notifications, including expired ones `visible` has not
    /// pruned yet.
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    pub fn last_notification(&self) -> Option<&Notification> {
        self.notifications.back()
    }

    pub fn open_modal(&mut self, modal: Modal) -> Result<(), EditError> {
        if self.modal.is_some() {
            return Err(EditError::ModalOpen);
        }
        self.validation = None;
        self.modal = Some(modal);
        Ok(())
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub fn modal_mut(&mut self) -> Option<&mut Modal> {
        self.modal.as_mut()
    }

    pub fn close_modal(&mut self) -> Option<Modal> {
        self.validation = None;
        self.modal.take()
    }

    pub fn set_validation(&mut self, message: impl Into<String>) {
        self.validation = Some(message.into());
    }

    pub fn validation(&self) -> Option<&str> {
        self.validation.as_deref()
    }

    pub fn request_reload(&mut self) {
        self.reload_requested = true;
    }

    pub fn reload_requested(&self) -> bool {
        self.reload_requested
    }
}
