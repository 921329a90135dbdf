use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn { user_id: Option<String> },
    SignedOut { reason: String },
    SessionExpired,
}

pub type AuthEventReceiver = broadcast::Receiver<AuthEvent>;

/// Explicit auth signalling channel, handed to whoever needs it.
#[derive(Debug, Clone)]
pub struct AuthEventBus {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> AuthEventReceiver {
        self.sender.subscribe()
    }

    /// 回傳收到事件的訂閱者數量；沒有訂閱者時為 0
    pub fn publish(&self, event: AuthEvent) -> usize {
        tracing::debug!("Auth event: {:?}", event);
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new(16)
    }
}
