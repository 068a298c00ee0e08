use tokio::sync::watch;

/// Broadcasts reload requests. Whoever owns the reload button keeps the hub, every panel that
/// wants to react keeps a [ReloadListener].
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: watch::Sender<u64>,
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadHub {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self { sender }
    }

    /// Asks every listener to reload. Listeners that are busy will see a single pending reload
    /// no matter how many times this was called.
    pub fn reload(&self) {
        self.sender
            .send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    pub fn subscribe(&self) -> ReloadListener {
        ReloadListener {
            receiver: self.sender.subscribe(),
        }
    }
}

pub struct ReloadListener {
    receiver: watch::Receiver<u64>,
}

impl ReloadListener {
    /// Waits for the next reload request. Returns `false` once the hub is gone.
    pub async fn requested(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ReloadHub, ReloadListener};

    async fn is_requested(listener: &mut ReloadListener) -> bool {
        tokio::time::timeout(Duration::from_millis(50), listener.requested())
            .await
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn listeners_see_reloads() {
        let hub = ReloadHub::new();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        assert!(!is_requested(&mut first).await);
        hub.reload();
        assert!(is_requested(&mut first).await);
        assert!(is_requested(&mut second).await);
        assert!(!is_requested(&mut second).await);
    }

    #[tokio::test]
    async fn repeated_reloads_coalesce() {
        let hub = ReloadHub::new();
        let mut listener = hub.subscribe();
        hub.reload();
        hub.reload();
        hub.reload();
        assert!(is_requested(&mut listener).await);
        assert!(!is_requested(&mut listener).await);
    }

    #[tokio::test]
    async fn dropping_the_hub_ends_listeners() {
        let hub = ReloadHub::new();
        let mut listener = hub.subscribe();
        drop(hub);
        let result = tokio::time::timeout(Duration::from_secs(1), listener.requested()).await;
        assert_eq!(result.ok(), Some(false));
    }

    #[tokio::test]
    async fn clones_share_listeners() {
        let hub = ReloadHub::new();
        let button = hub.clone();
        let mut listener = hub.subscribe();
        button.reload();
        assert!(listener.requested().await);
    }
}
