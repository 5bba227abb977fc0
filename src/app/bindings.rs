use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;

use crate::app::Message;
use crate::app::model::PickReply;
use crate::app::update::TaskOutcome;
use crate::capability::{CapabilityBroker, PickRequest};
use crate::editor::SharedBuffer;
use crate::notice::{Notice, Notifier};
use crate::session::{OpenOutcome, SessionManager, SessionStatus};

/// Glue between the synchronous UI loop and the session manager.
///
/// Triggers become tasks on the runtime; their results, notices, picker
/// requests and status changes come back as [`Message`]s from [`poll`].
///
/// [`poll`]: SessionBindings::poll
pub(super) struct SessionBindings {
    runtime: Handle,
    manager: Arc<SessionManager>,
    status: watch::Receiver<SessionStatus>,
    notices: UnboundedReceiver<Notice>,
    picks: Option<UnboundedReceiver<PickRequest>>,
    pending_pick: Option<PickRequest>,
    done_tx: UnboundedSender<TaskOutcome>,
    done_rx: UnboundedReceiver<TaskOutcome>,
}

impl SessionBindings {
    pub(super) fn new(
        runtime: Handle,
        broker: Arc<dyn CapabilityBroker>,
        picks: Option<UnboundedReceiver<PickRequest>>,
        editor: SharedBuffer,
    ) -> Self {
        let (notice_tx, notices) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let manager = Arc::new(SessionManager::new(
            broker,
            Arc::new(editor),
            Arc::new(notice_tx) as Arc<dyn Notifier>,
        ));
        let status = manager.subscribe();
        Self {
            runtime,
            manager,
            status,
            notices,
            picks,
            pending_pick: None,
            done_tx,
            done_rx,
        }
    }

    pub(super) fn spawn_open(&self) {
        let manager = Arc::clone(&self.manager);
        let done = self.done_tx.clone();
        self.runtime.spawn(async move {
            let outcome = match manager.open_new_file().await {
                Ok(OpenOutcome::Opened { name, .. }) => TaskOutcome::Opened { name },
                Ok(OpenOutcome::Cancelled) => TaskOutcome::Cancelled,
                Err(err) => TaskOutcome::Failed(err.to_string()),
            };
            let _ = done.send(outcome);
        });
    }

    pub(super) fn spawn_save(&self, revision: u64) {
        let manager = Arc::clone(&self.manager);
        let done = self.done_tx.clone();
        self.runtime.spawn(async move {
            let outcome = match manager.save_current_file().await {
                Ok(receipt) => TaskOutcome::Saved {
                    name: receipt.name,
                    bytes: receipt.bytes,
                    revision,
                },
                Err(err) => TaskOutcome::Failed(err.to_string()),
            };
            let _ = done.send(outcome);
        });
    }

    /// Deliver the prompt's answer to the waiting picker.
    ///
    /// Returns `false` if no pick was pending.
    pub(super) fn answer_pick(&mut self, reply: PickReply) -> bool {
        let Some(request) = self.pending_pick.take() else {
            return false;
        };
        match reply {
            PickReply::Choose(path) => request.choose(path),
            PickReply::Cancel => request.cancel(),
        }
        true
    }

    /// Drain everything that arrived since the last call, without blocking.
    pub(super) fn poll(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();

        if let Some(picks) = &mut self.picks {
            while let Ok(request) = picks.try_recv() {
                messages.push(Message::PromptShown(request.start_dir().to_path_buf()));
                // A newer request supersedes an unanswered one.
                self.pending_pick = Some(request);
            }
        }

        if self.status.has_changed().unwrap_or(false) {
            let status = self.status.borrow_and_update().clone();
            messages.push(Message::SessionChanged(status));
        }

        while let Ok(notice) = self.notices.try_recv() {
            messages.push(Message::Notice(notice));
        }

        while let Ok(outcome) = self.done_rx.try_recv() {
            if let TaskOutcome::Failed(err) = &outcome {
                tracing::debug!("session task failed: {err}");
            }
            messages.push(Message::TaskFinished(outcome));
        }

        messages
    }

    /// Release the session on exit.
    ///
    /// The close is fire-and-forget; `grace` only bounds how long exit waits
    /// for it so the stream can flush before the runtime shuts down.
    pub(super) fn teardown(&mut self, grace: Duration) {
        // Unblock an open that is still waiting on the prompt.
        if let Some(request) = self.pending_pick.take() {
            request.cancel();
        }
        let close = {
            let _enter = self.runtime.enter();
            self.manager.teardown()
        };
        let Some(close) = close else {
            return;
        };
        if self
            .runtime
            .block_on(async { tokio::time::timeout(grace, close).await })
            .is_err()
        {
            tracing::warn!("session close did not finish within {grace:?}, exiting anyway");
        }
    }
}
