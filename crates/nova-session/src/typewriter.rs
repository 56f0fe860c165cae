//! # Typewriter
//!
//! The streaming reducer: reveals an assistant message one character at a
//! time on a self-rescheduling timer, decoupled from how fast the network
//! delivers content.
//!
//! Each message id has at most one live tick chain. Feeding new content
//! updates the chain's target in place; scheduling a new chain (first feed,
//! finish, or a feed after the chain went idle) supersedes any pending one
//! by cancelling its token and bumping the generation, so two chains never
//! interleave for the same id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nova_core::{Message, MessageId};
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::events::SessionEvent;

/// Tick interval when the display lags far behind delivery
const FAST_TICK: Duration = Duration::from_millis(10);
/// Tick interval for a moderate backlog
const MEDIUM_TICK: Duration = Duration::from_millis(20);
/// Tick interval while comfortably keeping up
const SLOW_TICK: Duration = Duration::from_millis(30);

/// Backlog thresholds (characters) selecting the tick interval
const FAST_LAG: usize = 50;
const MEDIUM_LAG: usize = 20;

/// Pick the tick interval for the current backlog
fn tick_interval(lag: usize) -> Duration {
    if lag > FAST_LAG {
        FAST_TICK
    } else if lag > MEDIUM_LAG {
        MEDIUM_TICK
    } else {
        SLOW_TICK
    }
}

/// Per-message typing state
struct TypingState {
    /// Latest known full target text
    target: String,
    /// Whether the transport has delivered the final text
    finished: bool,
    /// Generation of the chain currently allowed to mutate this entry
    gen: u64,
    /// Cancellation token of the live chain, if one is running
    token: Option<CancellationToken>,
}

enum Tick {
    /// A character was appended; sleep this long before the next tick
    Continue(Duration),
    /// Chain is done (settled, idle, cancelled, or superseded)
    Exit,
}

/// Per-session typing driver, shared with the tick tasks it spawns
#[derive(Clone)]
pub struct Typewriter {
    messages: Arc<Mutex<Vec<Message>>>,
    states: Arc<Mutex<HashMap<MessageId, TypingState>>>,
    next_gen: Arc<AtomicU64>,
    events: Option<UnboundedSender<SessionEvent>>,
}

impl Typewriter {
    pub fn new(
        messages: Arc<Mutex<Vec<Message>>>,
        events: Option<UnboundedSender<SessionEvent>>,
    ) -> Self {
        Self {
            messages,
            states: Arc::new(Mutex::new(HashMap::new())),
            next_gen: Arc::new(AtomicU64::new(0)),
            events,
        }
    }

    /// Record the latest cumulative content for a message and make sure a
    /// tick chain is running for it.
    pub fn feed(&self, id: &str, cumulative: &str) {
        let mut states = self.states.lock();
        let entry = states.entry(id.to_string()).or_insert_with(TypingState::empty);
        entry.target = cumulative.to_string();

        if entry.token.is_none() {
            let _ = self.start_chain(entry, id.to_string());
        }
    }

    /// Deliver the final text and return a handle that resolves once the
    /// remaining characters are typed out and the message settles.
    pub fn finish(&self, id: &str, final_text: String) -> JoinHandle<()> {
        let mut states = self.states.lock();
        let entry = states.entry(id.to_string()).or_insert_with(TypingState::empty);
        entry.target = final_text;
        entry.finished = true;

        // Supersede whatever chain is pending; the catch-up chain owns the
        // settle.
        if let Some(token) = entry.token.take() {
            token.cancel();
        }
        self.start_chain(entry, id.to_string())
    }

    /// Drop all pending ticks for one message
    pub fn cancel(&self, id: &str) {
        let mut states = self.states.lock();
        if let Some(mut entry) = states.remove(id) {
            if let Some(token) = entry.token.take() {
                token.cancel();
            }
            debug!(%id, "typing cancelled");
        }
    }

    /// Drop all pending ticks for every message
    pub fn cancel_all(&self) {
        let mut states = self.states.lock();
        for (_, mut entry) in states.drain() {
            if let Some(token) = entry.token.take() {
                token.cancel();
            }
        }
    }

    /// Install a fresh generation and token on the entry and spawn its chain.
    /// Callers hold the states lock.
    fn start_chain(&self, entry: &mut TypingState, id: MessageId) -> JoinHandle<()> {
        let gen = self.next_gen.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();
        entry.gen = gen;
        entry.token = Some(token.clone());

        let typewriter = self.clone();
        tokio::spawn(async move { typewriter.run_chain(id, gen, token).await })
    }

    async fn run_chain(&self, id: MessageId, gen: u64, token: CancellationToken) {
        loop {
            match self.tick(&id, gen, &token) {
                Tick::Exit => return,
                Tick::Continue(interval) => {
                    tokio::select! {
                        _ = token.cancelled() => return,
                        _ = sleep(interval) => {}
                    }
                }
            }
        }
    }

    /// One tick: append exactly one character, or settle, or go idle.
    fn tick(&self, id: &str, gen: u64, token: &CancellationToken) -> Tick {
        let (outcome, event) = {
            let mut states = self.states.lock();
            let Some(entry) = states.get_mut(id) else {
                return Tick::Exit;
            };
            // A newer chain owns this entry now.
            if entry.gen != gen || token.is_cancelled() {
                return Tick::Exit;
            }

            let mut messages = self.messages.lock();
            let Some(message) = messages.iter_mut().find(|m| m.id == id) else {
                // The owning list was replaced; nothing left to type into.
                states.remove(id);
                return Tick::Exit;
            };

            let target: Vec<char> = entry.target.chars().collect();
            let shown_len = message
                .streamed_content
                .as_ref()
                .map(|s| s.chars().count())
                .unwrap_or(0);

            if shown_len < target.len() {
                message
                    .streamed_content
                    .get_or_insert_with(String::new)
                    .push(target[shown_len]);
                let lag = target.len() - (shown_len + 1);
                (
                    Tick::Continue(tick_interval(lag)),
                    Some(SessionEvent::Updated),
                )
            } else if entry.finished {
                message.settle(entry.target.clone());
                states.remove(id);
                debug!(%id, "message settled");
                (
                    Tick::Exit,
                    Some(SessionEvent::Settled { id: id.to_string() }),
                )
            } else {
                // Caught up with the stream; go idle until the next feed.
                entry.token = None;
                (Tick::Exit, None)
            }
        };

        if let (Some(event), Some(tx)) = (event, &self.events) {
            let _ = tx.send(event);
        }
        outcome
    }
}

impl TypingState {
    fn empty() -> Self {
        Self {
            target: String::new(),
            finished: false,
            gen: 0,
            token: None,
        }
    }
}
