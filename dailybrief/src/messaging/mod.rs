use anyhow::Result;
use tracing::{error, info};

pub mod line;

/// Outbound text delivery to a single recipient
#[async_trait::async_trait]
pub trait Messenger: Send + Sync {
    async fn push_text(&self, recipient: &str, text: &str) -> Result<()>;
}

/// Push `text` to `recipient`. Delivery failures are logged and reported as
/// `false`; they never propagate.
pub async fn publish<M: Messenger + ?Sized>(messenger: &M, recipient: &str, text: &str) -> bool {
    info!("Sending the digest ({} chars)", text.chars().count());

    match messenger.push_text(recipient, text).await {
        Ok(()) => {
            info!("Digest delivered");
            true
        }
        Err(e) => {
            error!("Digest delivery failed: {:#}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Messenger for Recorder {
        async fn push_text(&self, recipient: &str, text: &str) -> Result<()> {
            if self.fail {
                anyhow::bail!("401 Unauthorized");
            }
            self.sent.lock().unwrap().push((recipient.to_string(), text.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn publish_success() {
        let recorder = Recorder { sent: Mutex::new(Vec::new()), fail: false };
        assert!(publish(&recorder, "U1", "digest").await);
        assert_eq!(
            *recorder.sent.lock().unwrap(),
            vec![("U1".to_string(), "digest".to_string())]
        );
    }

    #[tokio::test]
    async fn publish_failure_is_swallowed() {
        let recorder = Recorder { sent: Mutex::new(Vec::new()), fail: true };
        assert!(!publish(&recorder, "U1", "digest").await);
        assert!(recorder.sent.lock().unwrap().is_empty());
    }
}
