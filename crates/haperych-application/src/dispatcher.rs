//! Serialised event processing.
//!
//! Events go through one channel into one worker task that owns every chat
//! session, so a session is read, routed and written back before the next
//! event is looked at.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use haperych_core::chat::{ChatEvent, ChatTransport, EventKind, Outgoing, Reply};
use haperych_core::session::Session;
use haperych_core::{HaperychError, Result};

use crate::router::Router;

const QUEUE_CAPACITY: usize = 64;

struct Envelope {
    event: ChatEvent,
    done: Option<oneshot::Sender<()>>,
}

/// Handle to the worker task.
pub struct Dispatcher {
    sender: mpsc::Sender<Envelope>,
    worker: JoinHandle<()>,
}

impl Dispatcher {
    /// Spawns the worker on the current tokio runtime.
    pub fn spawn(router: Router, transport: Arc<dyn ChatTransport>) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Envelope>(QUEUE_CAPACITY);
        let mut worker = Worker {
            operator_id: router.config().operator_id,
            router,
            transport,
            sessions: HashMap::new(),
        };

        let handle = tokio::spawn(async move {
            while let Some(Envelope { event, done }) = receiver.recv().await {
                worker.process(event).await;
                if let Some(done) = done {
                    let _ = done.send(());
                }
            }
            debug!("dispatcher queue closed");
        });

        Self {
            sender,
            worker: handle,
        }
    }

    /// Queues an event; waits while the queue is full.
    pub async fn submit(&self, event: ChatEvent) -> Result<()> {
        self.enqueue(event, None).await
    }

    /// Queues an event and waits until its replies have been delivered.
    pub async fn submit_and_wait(&self, event: ChatEvent) -> Result<()> {
        let (done, processed) = oneshot::channel();
        self.enqueue(event, Some(done)).await?;
        processed.await.map_err(|_| worker_gone())
    }

    async fn enqueue(&self, event: ChatEvent, done: Option<oneshot::Sender<()>>) -> Result<()> {
        self.sender
            .send(Envelope { event, done })
            .await
            .map_err(|_| worker_gone())
    }

    /// Stops taking events and waits until every queued one is processed.
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(e) = self.worker.await {
            error!("dispatcher worker panicked: {e}");
        }
    }
}

fn worker_gone() -> HaperychError {
    HaperychError::internal("dispatcher worker is gone")
}

struct Worker {
    router: Router,
    transport: Arc<dyn ChatTransport>,
    operator_id: i64,
    sessions: HashMap<i64, Session>,
}

impl Worker {
    async fn process(&mut self, event: ChatEvent) {
        if event.sender_id != self.operator_id {
            debug!(sender_id = event.sender_id, "ignoring event from non-operator");
            return;
        }

        let chat_id = event.chat_id;
        let session = self
            .sessions
            .entry(chat_id)
            .or_insert_with(|| Session::new(chat_id));

        let routed = match &event.kind {
            EventKind::Button { data } => {
                if let Err(e) = self.transport.acknowledge(chat_id).await {
                    warn!(chat_id, "acknowledge failed: {e}");
                }
                self.router.route_button(session, data).await
            }
            EventKind::Text { text } => self.router.route_text(session, text).await,
        };

        let reply = match routed {
            Ok(reply) if matches!(event.kind, EventKind::Button { .. }) => edit_in_place(reply),
            Ok(reply) => reply,
            Err(e) if e.is_unknown_flow() => {
                error!(chat_id, "{e}");
                return;
            }
            Err(e) => {
                error!(chat_id, "routing failed: {e}");
                session.reset();
                return;
            }
        };

        for message in &reply {
            if let Err(e) = self.transport.deliver(chat_id, message).await {
                error!(chat_id, "delivery failed: {e}");
            }
        }
    }
}

/// A pressed button's next menu replaces the menu it was pressed on.
fn edit_in_place(mut reply: Reply) -> Reply {
    if let Some(first) = reply.first_mut() {
        if let Outgoing::Menu { text, choices } = first {
            *first = Outgoing::EditMenu {
                text: std::mem::take(text),
                choices: std::mem::take(choices),
            };
        }
    }
    reply
}
