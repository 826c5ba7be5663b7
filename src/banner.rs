//! Shared error banner
//!
//! Holds the last error reported by any operation. Dismissing it only hides
//! the message; nothing is retried.

use std::fmt;

use crate::backend::error::ConsoleError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerMessage {
    pub message: String,
    /// What was being done, e.g. "whilst loading indexers"
    pub scope: Option<String>,
    pub auth: bool,
}

impl BannerMessage {
    pub fn new(err: ConsoleError, scope: impl Into<String>) -> Self {
        Self {
            auth: err.is_auth(),
            message: match err {
                ConsoleError::Auth(message)
                | ConsoleError::Network(message)
                | ConsoleError::Backend(message)
                | ConsoleError::Validation(message) => message,
                other => other.to_string(),
            },
            scope: Some(scope.into()),
        }
    }
}

impl fmt::Display for BannerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "Error {}: {}", scope, self.message),
            None => write!(f, "Error: {}", self.message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ErrorBanner {
    current: Option<BannerMessage>,
}

impl ErrorBanner {
    /// Replace whatever is shown with `message`
    pub fn show(&mut self, message: BannerMessage) {
        tracing::warn!("{}", message);
        self.current = Some(message);
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&BannerMessage> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_error_wins_and_dismiss_hides() {
        let mut banner = ErrorBanner::default();
        banner.show(BannerMessage::new(
            ConsoleError::Network("Bad Gateway".into()),
            "whilst loading indexers",
        ));
        banner.show(BannerMessage::new(
            ConsoleError::Backend("invalid cookie".into()),
            "whilst saving Example",
        ));

        let current = banner.current().unwrap();
        assert_eq!(current.to_string(), "Error whilst saving Example: invalid cookie");
        assert!(!current.auth);

        banner.dismiss();
        assert!(banner.current().is_none());
    }

    #[test]
    fn test_auth_errors_are_flagged() {
        let message = BannerMessage::new(ConsoleError::Auth("Not Authorized".into()), "whilst loading indexers");
        assert!(message.auth);
        assert_eq!(message.message, "Not Authorized");
    }
}
