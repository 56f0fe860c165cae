//! # Chat Session
//!
//! One conversation's controller: owns the message list, wires user input
//! through the transport with the typewriter as the delta sink, and persists
//! a history record once an exchange completes.

use std::sync::Arc;

use chrono::Utc;
use nova_client::{ChatTransport, DeltaCallback, UploadCallback};
use nova_core::{FileAttachment, Message, Role};
use nova_store::{HistoryItem, StoreManager};
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SessionResult;
use crate::events::SessionEvent;
use crate::typewriter::Typewriter;

/// Guard text rendered when no credential is configured
const MISSING_KEY_TEXT: &str = "Please configure your API key in settings first.";

/// Where the session is in its exchange cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingResponse,
}

/// A prior conversation handed back to the session by a front end
#[derive(Debug, Clone)]
pub struct HistoryLoad {
    pub messages: Vec<Message>,
    pub id: String,
    /// Re-enter the submit flow for a trailing user message
    pub resume_last: bool,
}

impl HistoryLoad {
    /// Load a stored conversation as-is
    pub fn from_item(item: HistoryItem) -> Self {
        Self {
            messages: item.messages,
            id: item.id,
            resume_last: false,
        }
    }
}

/// Controller for one chat session
pub struct ChatSession {
    id: Mutex<String>,
    messages: Arc<Mutex<Vec<Message>>>,
    phase: Mutex<Phase>,
    store: Arc<StoreManager>,
    transport: Arc<dyn ChatTransport>,
    typewriter: Typewriter,
    events: Option<UnboundedSender<SessionEvent>>,
}

impl ChatSession {
    pub fn new(
        store: Arc<StoreManager>,
        transport: Arc<dyn ChatTransport>,
        events: Option<UnboundedSender<SessionEvent>>,
    ) -> Self {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let typewriter = Typewriter::new(messages.clone(), events.clone());
        Self {
            id: Mutex::new(Uuid::new_v4().to_string()),
            messages,
            phase: Mutex::new(Phase::Idle),
            store,
            transport,
            typewriter,
            events,
        }
    }

    pub fn session_id(&self) -> String {
        self.id.lock().clone()
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    /// Snapshot of the message list
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    /// The in-flight assistant message, if a reply is streaming
    pub fn streaming_message(&self) -> Option<Message> {
        self.messages
            .lock()
            .iter()
            .rev()
            .find(|m| m.is_streaming)
            .cloned()
    }

    /// Submit one user turn and drive it to completion.
    ///
    /// Validation, configuration, and transport failures never escape; they
    /// are rendered into the message list as assistant error messages.
    pub async fn submit(
        &self,
        text: &str,
        files: Option<Vec<FileAttachment>>,
    ) -> SessionResult<()> {
        if self.store.api_key().trim().is_empty() {
            warn!("submit blocked: no API key configured");
            self.push_message(Message::error(MISSING_KEY_TEXT));
            self.emit(SessionEvent::Failed {
                message: MISSING_KEY_TEXT.to_string(),
            });
            return Ok(());
        }

        {
            let mut phase = self.phase.lock();
            if *phase != Phase::Idle {
                warn!("submit ignored: a response is already in flight");
                return Ok(());
            }
            *phase = Phase::AwaitingResponse;
        }

        let files = files.unwrap_or_default();
        let user_message = if files.is_empty() {
            Message::user(text)
        } else {
            Message::user_with_files(text, files.clone())
        };
        let user_id = user_message.id.clone();
        self.push_message(user_message);

        let placeholder = Message::streaming_placeholder();
        let assistant_id = placeholder.id.clone();
        self.push_message(placeholder);

        let typewriter = self.typewriter.clone();
        let delta_target = assistant_id.clone();
        let on_delta: DeltaCallback =
            Box::new(move |cumulative| typewriter.feed(&delta_target, cumulative));

        let result = self
            .transport
            .send(text, &files, on_delta, Some(self.upload_callback(&user_id)))
            .await;

        match result {
            Ok(final_text) => {
                debug!(session = %self.session_id(), "exchange complete");
                let _ = self.typewriter.finish(&assistant_id, final_text).await;
                *self.phase.lock() = Phase::Idle;
                self.save_history().await?;
            }
            Err(e) => {
                warn!(session = %self.session_id(), "exchange failed: {}", e);
                self.typewriter.cancel(&assistant_id);
                let user_text = e.user_message();
                {
                    let mut messages = self.messages.lock();
                    // Never leave a permanently-streaming placeholder behind.
                    messages.retain(|m| m.id != assistant_id);
                    if let Some(user) = messages.iter_mut().find(|m| m.id == user_id) {
                        if let Some(files) = user.files.as_mut() {
                            for file in files {
                                file.clear_upload_progress();
                            }
                        }
                    }
                    messages.push(Message::error(user_text.clone()));
                }
                self.emit(SessionEvent::Failed {
                    message: user_text,
                });
                self.emit(SessionEvent::Updated);
                *self.phase.lock() = Phase::Idle;
            }
        }

        Ok(())
    }

    /// Replace this session's state with a stored conversation.
    ///
    /// Pending typing is cancelled first so no late tick touches the new
    /// list. With `resume_last` set and a trailing user message present, the
    /// trailing message is popped and re-submitted.
    pub async fn load_history(&self, load: HistoryLoad) -> SessionResult<()> {
        self.typewriter.cancel_all();
        {
            let mut messages = self.messages.lock();
            *messages = load.messages;
        }
        *self.id.lock() = load.id.clone();
        *self.phase.lock() = Phase::Idle;
        info!(session = %load.id, "history loaded");
        self.emit(SessionEvent::Updated);

        if load.resume_last {
            let pending = {
                let mut messages = self.messages.lock();
                let trailing_user = messages
                    .last()
                    .map(|m| m.role == Role::User)
                    .unwrap_or(false);
                if trailing_user {
                    messages.pop()
                } else {
                    None
                }
            };
            if let Some(message) = pending {
                self.emit(SessionEvent::Updated);
                return self.submit(&message.content, message.files).await;
            }
        }
        Ok(())
    }

    /// Persist the session as a history record when it qualifies
    async fn save_history(&self) -> SessionResult<()> {
        let snapshot = self.messages.lock().clone();
        let id = self.session_id();
        if let Some(item) = HistoryItem::from_exchange(id, &snapshot, Utc::now()) {
            self.store.add_history(item).await?;
        }
        Ok(())
    }

    /// Progress sink updating the user message's attachments
    fn upload_callback(&self, user_id: &str) -> UploadCallback {
        let messages = self.messages.clone();
        let events = self.events.clone();
        let user_id = user_id.to_string();
        Box::new(move |name, progress| {
            let mut messages = messages.lock();
            if let Some(message) = messages.iter_mut().find(|m| m.id == user_id) {
                if let Some(files) = message.files.as_mut() {
                    if let Some(file) = files.iter_mut().find(|f| f.name == name) {
                        file.set_upload_progress(progress);
                    }
                }
            }
            if let Some(tx) = &events {
                let _ = tx.send(SessionEvent::Updated);
            }
        })
    }

    fn push_message(&self, message: Message) {
        self.messages.lock().push(message);
        self.emit(SessionEvent::Updated);
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.typewriter.cancel_all();
    }
}
