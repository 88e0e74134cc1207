//! The issue-creation session: collect, generate, review, commit.
//!
//! Each invocation of the create command runs [`run_session`] in its own task.
//! The task owns its [`Session`] exclusively and reads its input from the
//! [`CollectorHub`](crate::hub::CollectorHub) inbox. Window timers are the
//! only cancellation; everything inside a session is sequential.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

use scribe_completion::{CompletionError, CompletionRequest, InlineImage};
use scribe_core::{system_prompt, user_text, validate_issues, ReviewTimeoutPolicy};
use scribe_models::{
    Contribution, Conversation, Session, SessionMode, SessionState, UserRef,
};
use scribe_tracker::commit_batch;

use crate::callback::ReviewDecision;
use crate::error::Result;
use crate::hub::{CallbackEvent, InboundEvent, SessionAction};
use crate::render;
use crate::state::BotState;
use crate::transport::Keyboard;

/// Run one session to completion and return its terminal state.
///
/// In a forum chat the session gets its own topic; elsewhere it runs in the
/// chat the command came from.
pub async fn run_session(
    state: Arc<BotState>,
    owner: UserRef,
    origin: Conversation,
    forum: bool,
    mode: SessionMode,
) -> SessionState {
    let conversation = if forum {
        let title = format!("Issues from {}", owner.display_name);
        match state.transport.open_thread(origin.chat_id, &title).await {
            Ok(thread) => thread,
            Err(e) => {
                warn!(chat_id = origin.chat_id, error = %e, "Could not open session thread");
                let notice = render::failure("Could not open a thread for this session", &e.to_string());
                if let Err(e) = state.transport.send(origin, &notice, None).await {
                    warn!(chat_id = origin.chat_id, error = %e, "Failed to send failure notice");
                }
                return SessionState::Failed;
            }
        }
    } else {
        origin
    };

    let session = Session::new(owner, conversation, mode);
    let id = session.id.clone();
    let inbox = state.hub.register(id.clone(), conversation).await;
    info!(
        session_id = %id,
        chat_id = conversation.chat_id,
        thread_id = ?conversation.thread_id,
        mode = ?mode,
        "Session started"
    );

    let mut runner = SessionRunner {
        state: Arc::clone(&state),
        session,
        inbox,
    };
    let outcome = runner.run().await;

    state.hub.unregister(&id).await;
    let elapsed = Utc::now() - runner.session.created_at;
    info!(
        session_id = %id,
        state = %outcome,
        elapsed_secs = elapsed.num_seconds(),
        "Session ended"
    );
    outcome
}

struct SessionRunner {
    state: Arc<BotState>,
    session: Session,
    inbox: UnboundedReceiver<InboundEvent>,
}

impl SessionRunner {
    async fn run(&mut self) -> SessionState {
        match self.drive().await {
            Ok(()) => self.session.state(),
            Err(e) => {
                error!(session_id = %self.session.id, error = %e, "Session aborted");
                self.transition(SessionState::Failed);
                let notice = render::failure("Session aborted", &e.to_string());
                if let Err(e) = self.send(&notice, None).await {
                    warn!(session_id = %self.session.id, error = %e, "Failed to send failure notice");
                }
                SessionState::Failed
            }
        }
    }

    async fn drive(&mut self) -> Result<()> {
        self.collect().await?;

        if self.session.bundle().is_empty() {
            self.transition(SessionState::Canceled);
            self.send(&render::empty_bundle_notice(), None).await?;
            return Ok(());
        }

        self.transition(SessionState::Generating);
        let Some(status_id) = self.generate(None).await? else {
            return Ok(());
        };

        match self.session.mode {
            SessionMode::Direct => self.commit(Some(status_id)).await,
            SessionMode::Preview => {
                self.transition(SessionState::Reviewing);
                self.review(status_id).await
            }
        }
    }

    /// The collection window: append owner input until done or timeout.
    async fn collect(&mut self) -> Result<()> {
        let window = self.state.settings.windows.collect;
        let deadline = Instant::now() + window;
        let prompt = render::collect_prompt(self.session.mode, window);
        let prompt_id = self
            .send(&prompt, Some(render::collect_buttons(&self.session.id)))
            .await?;

        let reason = loop {
            let event = match timeout_at(deadline, self.inbox.recv()).await {
                Err(_) => break "timeout",
                Ok(None) => break "inbox closed",
                Ok(Some(event)) => event,
            };

            match event {
                InboundEvent::Message(msg) => {
                    if msg.unresolved_images > 0 && self.session.qualifies(&msg) {
                        warn!(
                            session_id = %self.session.id,
                            message_id = msg.message_id,
                            unresolved = msg.unresolved_images,
                            "Attachments could not be resolved"
                        );
                        let notice = render::attachments_unavailable(msg.unresolved_images);
                        self.send(&notice, None).await?;
                    }
                    match self.session.accept(&msg) {
                        Contribution::Ignored => {
                            debug!(
                                session_id = %self.session.id,
                                message_id = msg.message_id,
                                author = msg.author.id,
                                "Message ignored"
                            );
                        }
                        Contribution::EndSignal => break "end signal",
                        Contribution::Appended { texts, images } => {
                            let ack = render::contribution_ack(texts, images, self.session.bundle());
                            self.send(&ack, None).await?;
                        }
                    }
                }
                InboundEvent::Callback(cb) => {
                    if cb.action == SessionAction::CollectDone && cb.user_id == self.session.owner.id {
                        self.answer(&cb.callback_id, None).await;
                        break "done button";
                    }
                    self.answer_other(&cb).await;
                }
            }
        };

        let bundle = self.session.bundle();
        info!(
            session_id = %self.session.id,
            reason,
            texts = bundle.texts().len(),
            images = bundle.images().len(),
            "Collection window closed"
        );
        let closed = render::collect_closed(bundle);
        self.edit(prompt_id, &closed, None).await
    }

    /// Generate and validate a batch.
    ///
    /// Progress is rendered into `status_id` when given, otherwise into a new
    /// message. On success the batch is stored on the session and the status
    /// message id returned; `None` after reporting a failure.
    async fn generate(&mut self, status_id: Option<i32>) -> Result<Option<i32>> {
        let status_id = match status_id {
            Some(id) => {
                self.edit(id, &render::generating(0, ""), None).await?;
                id
            }
            None => self.send(&render::generating(0, ""), None).await?,
        };

        let images = self.load_images().await?;
        let request = CompletionRequest {
            system: system_prompt(),
            text: user_text(self.session.bundle().texts()),
            images,
        };

        let mut stream = match self.state.completion.stream_completion(request).await {
            Ok(stream) => stream,
            Err(e) => {
                self.fail_generation(status_id, &e.to_string(), "").await?;
                return Ok(None);
            }
        };

        let mut output = String::new();
        let mut chars = 0;
        let mut rendered = 0;
        while let Some(token) = stream.next().await {
            match token {
                Ok(token) => {
                    chars += token.chars().count();
                    output.push_str(&token);
                    if self.state.settings.throttle.should_render(rendered, chars) {
                        rendered = chars;
                        let progress = render::generating(chars, &output);
                        if let Err(e) = self.edit(status_id, &progress, None).await {
                            warn!(session_id = %self.session.id, error = %e, "Progress update failed");
                        }
                    }
                }
                Err(e) => {
                    self.fail_generation(status_id, &e.to_string(), &output).await?;
                    return Ok(None);
                }
            }
        }
        debug!(session_id = %self.session.id, chars, "Completion finished");

        match validate_issues(&output) {
            Ok(batch) => {
                info!(session_id = %self.session.id, issues = batch.len(), "Generated issues validated");
                self.session.set_generated(batch);
                Ok(Some(status_id))
            }
            Err(e) => {
                self.fail_generation(status_id, &e.to_string(), &output).await?;
                Ok(None)
            }
        }
    }

    /// Fetch bundle images; failures drop the image with a warning.
    async fn load_images(&self) -> Result<Vec<InlineImage>> {
        let urls = self.session.bundle().images().to_vec();
        let mut loaded = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            match self.state.images.fetch(url).await {
                Ok(image) => loaded.push(image),
                Err(e) => {
                    let reason = match e {
                        CompletionError::ImageFetch(reason) => reason,
                        other => other.to_string(),
                    };
                    warn!(session_id = %self.session.id, image = i + 1, reason = %reason, "Image dropped");
                    self.send(&render::image_warning(i + 1, &reason), None).await?;
                }
            }
        }
        Ok(loaded)
    }

    async fn fail_generation(&mut self, status_id: i32, error: &str, output: &str) -> Result<()> {
        warn!(session_id = %self.session.id, error, "Generation failed");
        self.transition(SessionState::Failed);
        self.edit(status_id, &render::generation_failure(error, output), None)
            .await
    }

    /// The review loop; returns once the session is terminal.
    async fn review(&mut self, review_id: i32) -> Result<()> {
        let windows = self.state.settings.windows;

        loop {
            self.drain().await;
            let Some(batch) = self.session.generated() else {
                return self.missing_batch();
            };
            let html = render::review(batch);
            self.edit(review_id, &html, Some(render::review_buttons(&self.session.id)))
                .await?;

            let decision = self.await_decision(windows.review).await;
            self.edit(review_id, &html, None).await?;

            match decision {
                None => {
                    info!(session_id = %self.session.id, "Review window expired");
                    self.transition(SessionState::Canceled);
                    if self.state.settings.review_timeout == ReviewTimeoutPolicy::Notify {
                        self.send(&render::review_expired(), None).await?;
                    }
                    return Ok(());
                }
                Some(ReviewDecision::Cancel) => {
                    self.transition(SessionState::Canceled);
                    self.send(&render::canceled(), None).await?;
                    return Ok(());
                }
                Some(ReviewDecision::Confirm) => return self.commit(None).await,
                Some(ReviewDecision::Edit) => {
                    self.drain().await;
                    let prompt_id = self.send(&render::edit_prompt(windows.edit), None).await?;
                    if !self.await_edit(windows.edit).await {
                        self.edit(prompt_id, &render::edit_timed_out(), None).await?;
                        continue;
                    }
                    self.edit(prompt_id, &render::edit_received(), None).await?;

                    self.transition(SessionState::Generating);
                    match self.generate(Some(review_id)).await? {
                        Some(_) => self.transition(SessionState::Reviewing),
                        None => return Ok(()),
                    }
                }
            }
        }
    }

    async fn await_decision(&mut self, window: Duration) -> Option<ReviewDecision> {
        let deadline = Instant::now() + window;
        loop {
            let event = match timeout_at(deadline, self.inbox.recv()).await {
                Ok(Some(event)) => event,
                _ => return None,
            };
            if let InboundEvent::Callback(cb) = event {
                match cb.action {
                    SessionAction::Review(decision) if cb.user_id == self.session.owner.id => {
                        self.answer(&cb.callback_id, None).await;
                        info!(session_id = %self.session.id, decision = ?decision, "Review decision");
                        return Some(decision);
                    }
                    _ => self.answer_other(&cb).await,
                }
            }
        }
    }

    /// Wait for one qualifying edit message; `false` on timeout.
    async fn await_edit(&mut self, window: Duration) -> bool {
        let deadline = Instant::now() + window;
        loop {
            let event = match timeout_at(deadline, self.inbox.recv()).await {
                Ok(Some(event)) => event,
                _ => return false,
            };
            match event {
                InboundEvent::Message(msg) => {
                    if self.session.accept_edit(&msg) {
                        return true;
                    }
                    debug!(session_id = %self.session.id, message_id = msg.message_id, "Edit input ignored");
                }
                InboundEvent::Callback(cb) => self.answer_other(&cb).await,
            }
        }
    }

    /// File the session's validated batch.
    async fn commit(&mut self, status_id: Option<i32>) -> Result<()> {
        let Some(batch) = self.session.generated().cloned() else {
            return self.missing_batch();
        };
        let filing = render::committing(batch.len());
        let status_id = match status_id {
            Some(id) => {
                self.edit(id, &filing, None).await?;
                id
            }
            None => self.send(&filing, None).await?,
        };

        let outcome = commit_batch(self.state.tracker.as_ref(), &batch.issues).await;
        if outcome.is_complete() {
            self.transition(SessionState::Committed);
        } else {
            self.transition(SessionState::Failed);
        }
        info!(
            session_id = %self.session.id,
            created = outcome.created.len(),
            total = batch.len(),
            "Commit finished"
        );

        self.edit(status_id, &render::commit_result(&outcome, batch.len()), None)
            .await
    }

    fn missing_batch(&mut self) -> Result<()> {
        error!(session_id = %self.session.id, state = %self.session.state(), "No validated batch");
        self.transition(SessionState::Failed);
        Ok(())
    }

    /// Discard input queued while no window was open.
    async fn drain(&mut self) {
        while let Ok(event) = self.inbox.try_recv() {
            if let InboundEvent::Callback(cb) = event {
                self.answer_other(&cb).await;
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        match self.session.advance(next) {
            Ok(()) => info!(session_id = %self.session.id, state = %next, "Session state changed"),
            Err(e) => warn!(session_id = %self.session.id, error = %e, "Transition rejected"),
        }
    }

    async fn send(&self, html: &str, buttons: Option<Keyboard>) -> Result<i32> {
        self.state
            .transport
            .send(self.session.conversation, html, buttons)
            .await
    }

    async fn edit(&self, message_id: i32, html: &str, buttons: Option<Keyboard>) -> Result<()> {
        self.state
            .transport
            .edit(self.session.conversation, message_id, html, buttons)
            .await
    }

    async fn answer(&self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self.state.transport.answer_callback(callback_id, text).await {
            debug!(session_id = %self.session.id, error = %e, "Callback answer failed");
        }
    }

    /// Answer a press that is not a decision for the current window.
    async fn answer_other(&self, cb: &CallbackEvent) {
        let text = if cb.user_id != self.session.owner.id {
            format!("Only {} can use these buttons.", self.session.owner.display_name)
        } else {
            "This button is no longer active.".to_string()
        };
        self.answer(&cb.callback_id, Some(&text)).await;
    }
}
