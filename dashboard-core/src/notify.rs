use std::fmt::Debug;

/// Shows a message to the user, dialog style.
pub trait Notifier: Send + Sync + Debug {
    fn error(&self, message: &str);
}
