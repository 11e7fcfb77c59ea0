//! Optimistic send lifecycle for a chat session
//!
//! [`Conversation::send_user_message`] appends the user's turn and an empty
//! assistant placeholder right away, then resolves the pair in the background
//! once the transport answers. Resolution goes through [`apply_outcome`], which
//! locates turns by id and only ever moves a pair out of `Pending` once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::Config;
use crate::state::{ChatRole, ChatTurn, TurnId, TurnStatus};
use crate::transport::ChatTransport;

/// Ids of the user turn and assistant placeholder created by one send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnPair {
    pub user: TurnId,
    pub assistant: TurnId,
}

/// How a transport call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered(String),
    Failed,
}

/// Resolve a pending pair in place.
///
/// Returns `false` and leaves `turns` untouched if the user turn is gone or
/// has already left `Pending`, so a repeated delivery is harmless.
pub fn apply_outcome(turns: &mut Vec<ChatTurn>, pair: TurnPair, outcome: SendOutcome) -> bool {
    let user = match turns.iter_mut().find(|t| t.id == pair.user) {
        Some(turn) if !turn.status.is_terminal() => turn,
        _ => return false,
    };

    match outcome {
        SendOutcome::Delivered(reply) => {
            user.status = TurnStatus::Sent;
            if let Some(placeholder) = turns
                .iter_mut()
                .find(|t| t.id == pair.assistant && !t.status.is_terminal())
            {
                placeholder.content = reply;
                placeholder.status = TurnStatus::Sent;
            }
        }
        SendOutcome::Failed => {
            user.status = TurnStatus::Failed;
            turns.retain(|t| t.id != pair.assistant);
        }
    }

    true
}

struct Shared {
    turns: Mutex<Vec<ChatTurn>>,
    closed: AtomicBool,
    revision: watch::Sender<u64>,
    transport: Arc<dyn ChatTransport>,
    typing_delay: Duration,
}

impl Shared {
    fn lock_turns(&self) -> MutexGuard<'_, Vec<ChatTurn>> {
        // A panic while holding the lock can't leave the Vec half-written
        self.turns.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    fn resolve(&self, pair: TurnPair, outcome: SendOutcome) -> bool {
        if self.closed.load(Ordering::Acquire) {
            debug!(turn = %pair.user, "conversation closed, dropping completion");
            return false;
        }

        let applied = apply_outcome(&mut self.lock_turns(), pair, outcome);
        if applied {
            self.notify();
        } else {
            debug!(turn = %pair.user, "turn already resolved, ignoring completion");
        }
        applied
    }
}

/// Handle to the background half of a send. Dropping it doesn't cancel
/// anything; the transport call always runs to completion.
pub struct PendingSend {
    pair: TurnPair,
    handle: JoinHandle<bool>,
}

impl PendingSend {
    pub fn pair(&self) -> TurnPair {
        self.pair
    }

    /// Wait for the transport call and its state update. Returns whether the
    /// outcome was applied to the list.
    pub async fn finished(self) -> bool {
        self.handle.await.unwrap_or(false)
    }
}

/// The ordered turn list of one chat session. Cloning shares the same list.
#[derive(Clone)]
pub struct Conversation {
    shared: Arc<Shared>,
}

impl Conversation {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self::with_typing_delay(transport, Duration::ZERO)
    }

    pub fn with_typing_delay(transport: Arc<dyn ChatTransport>, typing_delay: Duration) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                turns: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
                revision,
                transport,
                typing_delay,
            }),
        }
    }

    pub fn from_config(transport: Arc<dyn ChatTransport>, config: &Config) -> Self {
        Self::with_typing_delay(transport, config.typing_delay())
    }

    /// Optimistically append `text` and a reply placeholder, then ask the
    /// transport for the reply in a background task.
    ///
    /// Blank input, or a closed conversation, is a no-op returning `None`.
    /// Must be called from within a Tokio runtime.
    pub fn send_user_message(&self, text: &str) -> Option<PendingSend> {
        if text.trim().is_empty() {
            return None;
        }
        if self.is_closed() {
            debug!("send on closed conversation ignored");
            return None;
        }

        let user = ChatTurn::user(text);
        let placeholder = ChatTurn::placeholder();
        let pair = TurnPair {
            user: user.id,
            assistant: placeholder.id,
        };

        {
            let mut turns = self.shared.lock_turns();
            turns.push(user);
            turns.push(placeholder);
        }
        self.shared.notify();
        debug!(turn = %pair.user, placeholder = %pair.assistant, "appended pending turn pair");

        let shared = Arc::clone(&self.shared);
        let text = text.to_string();
        let handle = tokio::spawn(async move {
            if !shared.typing_delay.is_zero() {
                tokio::time::sleep(shared.typing_delay).await;
            }

            let outcome = match shared.transport.send(&text).await {
                Ok(reply) => {
                    debug!(turn = %pair.user, reply_len = reply.len(), "reply received");
                    SendOutcome::Delivered(reply)
                }
                Err(err) => {
                    warn!(turn = %pair.user, error = %err, "chat send failed");
                    SendOutcome::Failed
                }
            };

            shared.resolve(pair, outcome)
        });

        Some(PendingSend { pair, handle })
    }

    /// Apply a transport outcome to `pair`. Only the first call for a pair
    /// has any effect.
    pub fn resolve(&self, pair: TurnPair, outcome: SendOutcome) -> bool {
        self.shared.resolve(pair, outcome)
    }

    /// Snapshot of the turns in append order
    pub fn turns(&self) -> Vec<ChatTurn> {
        self.shared.lock_turns().clone()
    }

    pub fn len(&self) -> usize {
        self.shared.lock_turns().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True while any sent message is still waiting on the backend
    pub fn is_awaiting_reply(&self) -> bool {
        self.shared
            .lock_turns()
            .iter()
            .any(|t| t.role == ChatRole::User && !t.status.is_terminal())
    }

    /// Revision counter that changes on every mutation of the list
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// End the session. Replies that arrive afterwards are discarded.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
}
