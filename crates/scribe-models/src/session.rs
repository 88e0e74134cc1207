//! Session types for issue-creation flows.
//!
//! A [`Session`] lives from the moment a user invokes the create command until
//! its issues are committed, the user cancels, or a step fails. It owns the
//! [`Bundle`] of collected input and the slot for the generated batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::SessionId;
use crate::issue::IssueBatch;

/// Prefix marking a bundle fragment that came from the review loop's edit step.
pub const EDIT_INSTRUCTION_TAG: &str = "[EDIT REQUEST]";

/// Text a user can send on its own to close the collection window.
const END_SIGNAL: &str = "done";

/// Identity of a chat participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    /// Platform user id.
    pub id: i64,
    /// Display name (username or first name).
    pub display_name: String,
    /// Whether the account is a bot.
    pub is_bot: bool,
}

impl UserRef {
    /// A human participant.
    pub fn human(id: i64, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            is_bot: false,
        }
    }
}

/// A conversation: a chat, optionally narrowed to one thread in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conversation {
    /// Chat id.
    pub chat_id: i64,
    /// Thread (forum topic) id within the chat.
    pub thread_id: Option<i32>,
}

impl Conversation {
    /// A whole chat with no thread.
    pub fn chat(chat_id: i64) -> Self {
        Self {
            chat_id,
            thread_id: None,
        }
    }

    /// A thread within a chat.
    pub fn thread(chat_id: i64, thread_id: i32) -> Self {
        Self {
            chat_id,
            thread_id: Some(thread_id),
        }
    }
}

/// An inbound chat message, already stripped of platform specifics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Where the message was posted.
    pub conversation: Conversation,
    /// Platform message id.
    pub message_id: i32,
    /// Who posted it.
    pub author: UserRef,
    /// Text or caption, if any.
    pub text: Option<String>,
    /// Resolved URLs of attached images, in attachment order.
    pub image_urls: Vec<String>,
    /// Attached images whose URL could not be resolved.
    pub unresolved_images: usize,
}

impl InboundMessage {
    /// Trimmed text, if it is non-empty.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Whether a session shows the batch for approval or commits it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Render the batch and wait for confirm / edit / cancel.
    Preview,
    /// Commit as soon as generation validates.
    Direct,
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Accepting input.
    Open,
    /// Waiting for the completion to finish.
    Generating,
    /// Waiting for the owner's decision on a rendered batch.
    Reviewing,
    /// Issues were filed.
    Committed,
    /// The owner canceled or a window lapsed.
    Canceled,
    /// A step failed; the session was aborted.
    Failed,
}

impl SessionState {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Canceled | Self::Failed)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (_, Failed) => !self.is_terminal(),
            (Open, Generating) | (Open, Canceled) => true,
            (Generating, Reviewing) | (Generating, Committed) => true,
            (Reviewing, Generating) | (Reviewing, Committed) | (Reviewing, Canceled) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Generating => "generating",
            Self::Reviewing => "reviewing",
            Self::Committed => "committed",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Rejected state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid session transition: {from} -> {to}")]
pub struct InvalidTransition {
    /// State the session was in.
    pub from: SessionState,
    /// State that was requested.
    pub to: SessionState,
}

/// Collected input: text fragments and image references, append-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    texts: Vec<String>,
    images: Vec<String>,
}

impl Bundle {
    /// Text fragments in arrival order.
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Image URLs in arrival order.
    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// Whether nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.images.is_empty()
    }

    /// Append a text fragment. Blank text is not stored.
    pub fn push_text(&mut self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.texts.push(trimmed.to_string());
        true
    }

    /// Append image references, returning how many were added.
    pub fn push_images<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.images.len();
        self.images.extend(urls.into_iter().map(Into::into));
        self.images.len() - before
    }

    /// Append a tagged edit instruction from the review loop.
    pub fn push_edit_instruction(&mut self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.texts
            .push(format!("{} {}", EDIT_INSTRUCTION_TAG, trimmed));
        true
    }
}

/// What a message did to a session's bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contribution {
    /// The message did not qualify and the bundle is unchanged.
    Ignored,
    /// The owner asked to close the collection window.
    EndSignal,
    /// The message was appended.
    Appended {
        /// Text fragments added (0 or 1).
        texts: usize,
        /// Image references added.
        images: usize,
    },
}

/// One issue-creation session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session id.
    pub id: SessionId,
    /// User who invoked the command; the only one whose input counts.
    pub owner: UserRef,
    /// Conversation the session collects from and reports to.
    pub conversation: Conversation,
    /// Preview or direct commit.
    pub mode: SessionMode,
    /// When the session started.
    pub created_at: DateTime<Utc>,
    state: SessionState,
    bundle: Bundle,
    generated: Option<IssueBatch>,
}

impl Session {
    /// Create an open session.
    pub fn new(owner: UserRef, conversation: Conversation, mode: SessionMode) -> Self {
        Self {
            id: SessionId::new(),
            owner,
            conversation,
            mode,
            created_at: Utc::now(),
            state: SessionState::Open,
            bundle: Bundle::default(),
            generated: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Collected input.
    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    /// The last validated batch, if generation has completed.
    pub fn generated(&self) -> Option<&IssueBatch> {
        self.generated.as_ref()
    }

    /// Store a validated batch, replacing any earlier one.
    pub fn set_generated(&mut self, batch: IssueBatch) {
        self.generated = Some(batch);
    }

    /// Move to `next`, rejecting illegal transitions.
    pub fn advance(&mut self, next: SessionState) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Whether a message comes from the owner, in this conversation, and not from a bot.
    pub fn qualifies(&self, msg: &InboundMessage) -> bool {
        !msg.author.is_bot && msg.author.id == self.owner.id && msg.conversation == self.conversation
    }

    /// Feed a message to the open collection window.
    pub fn accept(&mut self, msg: &InboundMessage) -> Contribution {
        if self.state != SessionState::Open || !self.qualifies(msg) {
            return Contribution::Ignored;
        }

        if msg.image_urls.is_empty()
            && msg
                .trimmed_text()
                .is_some_and(|t| t.eq_ignore_ascii_case(END_SIGNAL))
        {
            return Contribution::EndSignal;
        }

        let texts = msg
            .trimmed_text()
            .map(|t| usize::from(self.bundle.push_text(t)))
            .unwrap_or(0);
        let images = self.bundle.push_images(msg.image_urls.iter().cloned());

        if texts == 0 && images == 0 {
            Contribution::Ignored
        } else {
            Contribution::Appended { texts, images }
        }
    }

    /// Append an edit instruction while reviewing. Returns false for non-qualifying or blank input.
    pub fn accept_edit(&mut self, msg: &InboundMessage) -> bool {
        if self.state != SessionState::Reviewing || !self.qualifies(msg) {
            return false;
        }
        msg.trimmed_text()
            .is_some_and(|t| self.bundle.push_edit_instruction(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: i64 = 100;

    fn owner() -> UserRef {
        UserRef::human(1, "alice")
    }

    fn message(author: UserRef, text: Option<&str>, images: &[&str]) -> InboundMessage {
        InboundMessage {
            conversation: Conversation::chat(CHAT),
            message_id: 10,
            author,
            text: text.map(String::from),
            image_urls: images.iter().map(|s| s.to_string()).collect(),
            unresolved_images: 0,
        }
    }

    fn session() -> Session {
        Session::new(owner(), Conversation::chat(CHAT), SessionMode::Direct)
    }

    #[test]
    fn test_accept_appends_text_and_images() {
        let mut session = session();
        session.bundle.push_text("earlier");

        let msg = message(owner(), Some("The login page hangs"), &["u1", "u2", "u3"]);
        let contribution = session.accept(&msg);

        assert_eq!(contribution, Contribution::Appended { texts: 1, images: 3 });
        assert_eq!(session.bundle().texts().len(), 2);
        assert_eq!(session.bundle().images().len(), 3);
    }

    #[test]
    fn test_accept_ignores_bots_and_strangers() {
        let mut session = session();

        let bot = UserRef {
            id: 1,
            display_name: "scribe".into(),
            is_bot: true,
        };
        assert_eq!(session.accept(&message(bot, Some("hi"), &["x"])), Contribution::Ignored);
        let stranger = UserRef::human(2, "mallory");
        assert_eq!(session.accept(&message(stranger, Some("hi"), &[])), Contribution::Ignored);

        assert!(session.bundle().is_empty());
    }

    #[test]
    fn test_accept_ignores_other_conversations() {
        let mut session = session();
        let mut msg = message(owner(), Some("hello"), &[]);
        msg.conversation = Conversation::thread(CHAT, 5);

        assert_eq!(session.accept(&msg), Contribution::Ignored);
        assert!(session.bundle().is_empty());
    }

    #[test]
    fn test_blank_text_adds_no_fragment() {
        let mut session = session();
        let contribution = session.accept(&message(owner(), Some("   "), &["u1"]));
        assert_eq!(contribution, Contribution::Appended { texts: 0, images: 1 });
        assert!(session.bundle().texts().is_empty());
    }

    #[test]
    fn test_end_signal() {
        let mut session = session();
        assert_eq!(session.accept(&message(owner(), Some(" Done "), &[])), Contribution::EndSignal);
        assert!(session.bundle().is_empty());
    }

    #[test]
    fn test_accept_after_close_is_ignored() {
        let mut session = session();
        session.advance(SessionState::Generating).unwrap();
        assert_eq!(session.accept(&message(owner(), Some("late"), &[])), Contribution::Ignored);
    }

    #[test]
    fn test_transitions() {
        let mut session = session();
        assert!(session.advance(SessionState::Committed).is_err());
        session.advance(SessionState::Generating).unwrap();
        session.advance(SessionState::Reviewing).unwrap();
        session.advance(SessionState::Generating).unwrap();
        session.advance(SessionState::Reviewing).unwrap();
        session.advance(SessionState::Canceled).unwrap();

        let err = session.advance(SessionState::Committed).unwrap_err();
        assert_eq!(err.from, SessionState::Canceled);
        assert!(session.advance(SessionState::Failed).is_err());
    }

    #[test]
    fn test_edit_instruction_is_tagged() {
        let mut session = Session::new(owner(), Conversation::chat(CHAT), SessionMode::Preview);
        session.advance(SessionState::Generating).unwrap();
        session.advance(SessionState::Reviewing).unwrap();

        assert!(session.accept_edit(&message(owner(), Some("merge the two tickets"), &[])));
        assert!(!session.accept_edit(&message(UserRef::human(9, "bob"), Some("no"), &[])));
        assert_eq!(
            session.bundle().texts(),
            &[format!("{} merge the two tickets", EDIT_INSTRUCTION_TAG)]
        );
    }

    #[test]
    fn test_regenerated_batch_replaces_draft() {
        use crate::issue::GeneratedIssue;

        let mut session = Session::new(owner(), Conversation::chat(CHAT), SessionMode::Preview);
        assert!(session.generated().is_none());

        let first = IssueBatch {
            issues: vec![
                GeneratedIssue::new("Export button broken", "body one", vec![]),
                GeneratedIssue::new("Import button broken", "body two", vec![]),
            ],
        };
        session.set_generated(first);
        assert_eq!(session.generated().map(IssueBatch::len), Some(2));

        let merged = IssueBatch {
            issues: vec![GeneratedIssue::new("Import and export broken", "body", vec![])],
        };
        session.set_generated(merged.clone());
        assert_eq!(session.generated(), Some(&merged));
    }
}
