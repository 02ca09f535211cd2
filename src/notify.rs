use std::fmt;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

pub const DELIVERY_ATTEMPTS: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Outbound messages sent to users. `Debug` output redacts the token.
#[derive(Clone, PartialEq)]
pub enum Notification {
    Welcome { user_id: i64, activation_token: String },
    PasswordReset { reset_token: String },
}

impl Notification {
    pub fn template(&self) -> &'static str {
        match self {
            Notification::Welcome { .. } => "user_welcome",
            Notification::PasswordReset { .. } => "password_reset",
        }
    }

    /// The plaintext token the recipient needs.
    pub fn token(&self) -> &str {
        match self {
            Notification::Welcome { activation_token, .. } => activation_token,
            Notification::PasswordReset { reset_token } => reset_token,
        }
    }
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Welcome { user_id, .. } => f
                .debug_struct("Welcome")
                .field("user_id", user_id)
                .field("activation_token", &"[redacted]")
                .finish(),
            Notification::PasswordReset { .. } => {
                f.debug_struct("PasswordReset").field("reset_token", &"[redacted]").finish()
            }
        }
    }
}

/// Delivery transport for [`Notification`]s.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, notification: &Notification) -> Result<()>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &str, notification: &Notification) -> Result<()> {
        info!(recipient, template = notification.template(), "Notification: {:?}", notification);
        debug!(recipient, template = notification.template(), token = notification.token(), "Notification token");
        Ok(())
    }
}

/// Sends with up to [`DELIVERY_ATTEMPTS`] tries, [`RETRY_DELAY`] apart.
pub async fn deliver(notifier: &dyn Notifier, recipient: &str, notification: &Notification) -> Result<()> {
    let mut attempt = 1;
    loop {
        match notifier.send(recipient, notification).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < DELIVERY_ATTEMPTS => {
                warn!(attempt, template = notification.template(), "Notification delivery failed: {}", e);
                attempt += 1;
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(e) => return Err(e.context(format!("giving up after {} attempts", DELIVERY_ATTEMPTS))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` sends.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Notifier for Flaky {
        async fn send(&self, _recipient: &str, _notification: &Notification) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                anyhow::bail!("transport unavailable");
            }
            Ok(())
        }
    }

    fn reset() -> Notification {
        Notification::PasswordReset { reset_token: "ABCDEFGHIJKLMNOPQRSTUVWXYZ".into() }
    }

    #[test]
    fn debug_output_hides_tokens() {
        let welcome = Notification::Welcome { user_id: 7, activation_token: "ABCDEFGHIJKLMNOPQRSTUVWXYZ".into() };
        for notification in [welcome, reset()] {
            let printed = format!("{:?}", notification);
            assert!(!printed.contains(notification.token()), "{}", printed);
            assert!(printed.contains("[redacted]"));
        }
        assert_eq!(reset().token(), "ABCDEFGHIJKLMNOPQRSTUVWXYZ");
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let notifier = Flaky { failures: 2, calls: AtomicU32::new(0) };
        deliver(&notifier, "ada@example.com", &reset()).await.unwrap();
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_attempts() {
        let notifier = Flaky { failures: 10, calls: AtomicU32::new(0) };
        assert!(deliver(&notifier, "ada@example.com", &reset()).await.is_err());
        assert_eq!(notifier.calls.load(Ordering::SeqCst), DELIVERY_ATTEMPTS);
    }
}
