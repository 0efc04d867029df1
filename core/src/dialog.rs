//! Confirmation step in front of destructive actions.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

impl ConfirmPrompt {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_label: "Confirm".to_string(),
            cancel_label: "Cancel".to_string(),
        }
    }

    pub fn with_confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = label.into();
        self
    }
}

/// Holds the subject awaiting confirmation.
///
/// `confirm` hands the subject back exactly once; `cancel` drops it. While the
/// confirmed action runs the prompt stays visible and `is_busy` is true, so
/// neither a second confirm nor a cancel has any effect until `finish`.
#[derive(Debug)]
pub struct ConfirmDialog<T> {
    subject: Option<T>,
    prompt: Option<ConfirmPrompt>,
    busy: bool,
}

impl<T> Default for ConfirmDialog<T> {
    fn default() -> Self {
        Self {
            subject: None,
            prompt: None,
            busy: false,
        }
    }
}

impl<T> ConfirmDialog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignored while a confirmed action is running.
    pub fn open(&mut self, subject: T, prompt: ConfirmPrompt) {
        if self.busy {
            return;
        }
        self.subject = Some(subject);
        self.prompt = Some(prompt);
    }

    pub fn is_open(&self) -> bool {
        self.prompt.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn prompt(&self) -> Option<&ConfirmPrompt> {
        self.prompt.as_ref()
    }

    pub fn subject(&self) -> Option<&T> {
        self.subject.as_ref()
    }

    /// Take the subject and mark the dialog busy.
    pub fn confirm(&mut self) -> Option<T> {
        if self.busy {
            return None;
        }
        let subject = self.subject.take()?;
        self.busy = true;
        Some(subject)
    }

    /// The confirmed action completed, successfully or not.
    pub fn finish(&mut self) {
        self.busy = false;
        self.prompt = None;
    }

    pub fn cancel(&mut self) {
        if self.busy {
            return;
        }
        self.subject = None;
        self.prompt = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt() -> ConfirmPrompt {
        ConfirmPrompt::new("Delete film", "Delete \"Inception\"?").with_confirm_label("Delete")
    }

    #[test]
    fn confirm_hands_subject_back_once() {
        let mut dialog = ConfirmDialog::new();
        dialog.open("f1".to_string(), prompt());
        assert_eq!(dialog.subject().map(String::as_str), Some("f1"));

        assert_eq!(dialog.confirm().as_deref(), Some("f1"));
        assert!(dialog.is_busy());
        assert!(dialog.is_open());
        assert_eq!(dialog.confirm(), None);

        dialog.finish();
        assert!(!dialog.is_open());
        assert!(!dialog.is_busy());
    }

    #[test]
    fn cancel_discards_subject() {
        let mut dialog = ConfirmDialog::new();
        dialog.open(7u32, prompt());
        dialog.cancel();
        assert!(!dialog.is_open());
        assert_eq!(dialog.confirm(), None);
    }

    #[test]
    fn busy_dialog_ignores_cancel_and_reopen() {
        let mut dialog = ConfirmDialog::new();
        dialog.open(1u32, prompt());
        dialog.confirm();
        dialog.cancel();
        dialog.open(2u32, prompt());
        assert!(dialog.is_busy());
        assert_eq!(dialog.subject(), None);
        assert_eq!(dialog.prompt().map(|p| p.confirm_label.as_str()), Some("Delete"));
    }
}
