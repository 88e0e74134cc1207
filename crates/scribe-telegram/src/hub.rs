//! Routing of inbound chat events to running sessions.
//!
//! The dispatcher pushes every update to a handler; sessions, however, wait
//! for input inside their own task. Each session registers here and receives
//! the messages posted in its conversation and the button presses addressed
//! to it through an unbounded channel. Filtering (owner, bots) is the
//! session's job.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, trace};

use scribe_models::{Conversation, InboundMessage, SessionId};

use crate::callback::ReviewDecision;

/// A button press addressed to one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEvent {
    /// Callback query id, to be answered by the session.
    pub callback_id: String,
    /// User who pressed the button.
    pub user_id: i64,
    pub action: SessionAction,
}

/// What a session button asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    CollectDone,
    Review(ReviewDecision),
}

/// Event delivered to a session task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Message(InboundMessage),
    Callback(CallbackEvent),
}

struct Route {
    conversation: Conversation,
    tx: mpsc::UnboundedSender<InboundEvent>,
}

/// Routing table from running sessions to their inboxes.
#[derive(Default)]
pub struct CollectorHub {
    routes: RwLock<HashMap<SessionId, Route>>,
}

impl CollectorHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and get its inbox.
    pub async fn register(
        &self,
        id: SessionId,
        conversation: Conversation,
    ) -> mpsc::UnboundedReceiver<InboundEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        debug!(session_id = %id, chat_id = conversation.chat_id, "Session registered");
        self.routes
            .write()
            .await
            .insert(id, Route { conversation, tx });
        rx
    }

    /// Remove a session's route.
    pub async fn unregister(&self, id: &SessionId) {
        if self.routes.write().await.remove(id).is_some() {
            debug!(session_id = %id, "Session unregistered");
        }
    }

    /// Whether any session listens in this conversation.
    pub async fn is_listening(&self, conversation: Conversation) -> bool {
        self.routes
            .read()
            .await
            .values()
            .any(|r| r.conversation == conversation)
    }

    /// Sessions listening in this conversation.
    pub async fn sessions_in(&self, conversation: Conversation) -> Vec<SessionId> {
        self.routes
            .read()
            .await
            .iter()
            .filter(|(_, r)| r.conversation == conversation)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of running sessions.
    pub async fn active_sessions(&self) -> usize {
        self.routes.read().await.len()
    }

    /// Forward a message to every session in its conversation. Returns the fan-out.
    pub async fn dispatch_message(&self, msg: InboundMessage) -> usize {
        let routes = self.routes.read().await;
        let mut delivered = 0;
        for (id, route) in routes.iter() {
            if route.conversation != msg.conversation {
                continue;
            }
            if route.tx.send(InboundEvent::Message(msg.clone())).is_ok() {
                trace!(session_id = %id, message_id = msg.message_id, "Message routed");
                delivered += 1;
            }
        }
        delivered
    }

    /// Forward a button press to one session. `false` if it is not running.
    pub async fn dispatch_callback(&self, id: &SessionId, event: CallbackEvent) -> bool {
        match self.routes.read().await.get(id) {
            Some(route) => route.tx.send(InboundEvent::Callback(event)).is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_models::UserRef;

    fn message(conversation: Conversation) -> InboundMessage {
        InboundMessage {
            conversation,
            message_id: 1,
            author: UserRef::human(1, "alice"),
            text: Some("hello".into()),
            image_urls: vec![],
            unresolved_images: 0,
        }
    }

    #[tokio::test]
    async fn test_messages_fan_out_by_conversation() {
        let hub = CollectorHub::new();
        let here = Conversation::chat(1);
        let there = Conversation::thread(1, 7);

        let mut a = hub.register(SessionId::new(), here).await;
        let mut b = hub.register(SessionId::new(), here).await;
        let mut c = hub.register(SessionId::new(), there).await;

        assert_eq!(hub.dispatch_message(message(here)).await, 2);
        assert!(a.try_recv().is_ok());
        assert!(b.try_recv().is_ok());
        assert!(c.try_recv().is_err());
        assert!(hub.is_listening(there).await);
        assert!(!hub.is_listening(Conversation::chat(2)).await);
    }

    #[tokio::test]
    async fn test_callbacks_reach_one_session() {
        let hub = CollectorHub::new();
        let id = SessionId::new();
        let mut rx = hub.register(id.clone(), Conversation::chat(1)).await;

        let event = CallbackEvent {
            callback_id: "cb".into(),
            user_id: 1,
            action: SessionAction::CollectDone,
        };
        assert!(hub.dispatch_callback(&id, event.clone()).await);
        assert_eq!(rx.try_recv().ok(), Some(InboundEvent::Callback(event.clone())));

        hub.unregister(&id).await;
        assert!(!hub.dispatch_callback(&id, event).await);
        assert_eq!(hub.active_sessions().await, 0);
    }
}
