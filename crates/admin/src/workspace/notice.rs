//! Transient success notices.

use std::time::Duration;

use tokio::time::Instant;

/// How long a success notice stays visible.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

/// A message that disappears [`NOTICE_TTL`] after it is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    message: String,
    shown_at: Instant,
}

impl Notice {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            shown_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.shown_at.elapsed() < NOTICE_TTL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_notice_expires() {
        let notice = Notice::new("Product created successfully.");
        assert!(notice.is_visible());
        assert_eq!(notice.message(), "Product created successfully.");

        tokio::time::advance(Duration::from_millis(2_999)).await;
        assert!(notice.is_visible());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!notice.is_visible());
    }
}
