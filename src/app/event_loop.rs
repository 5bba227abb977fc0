use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, ToastLevel, update};
use crate::capability::{CapabilityBroker, MemoryBroker, PromptBroker};
use crate::editor::SharedBuffer;

use super::bindings::SessionBindings;

/// How long exit waits for the session stream to close.
const TEARDOWN_GRACE: Duration = Duration::from_millis(500);

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Run the main event loop.
    ///
    /// The active session is torn down on the way out, whether the loop
    /// ended normally or with an error.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization or the event loop
    /// encounters an I/O failure.
    pub fn run(&mut self) -> Result<()> {
        let editor = SharedBuffer::new();
        let (broker, picks): (Arc<dyn CapabilityBroker>, _) = if self.debug {
            (Arc::new(MemoryBroker::debug()), None)
        } else {
            let (broker, picks) = PromptBroker::new(self.start_dir.clone());
            (Arc::new(broker), Some(picks))
        };
        let mut bindings = SessionBindings::new(self.runtime.clone(), broker, picks, editor.clone());

        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; quill requires an interactive terminal")?;
        let size = terminal.size()?;

        let mut model = Model::new(editor, (size.width, size.height));
        model.debug = self.debug;
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);
        if self.debug {
            model.show_toast(ToastLevel::Info, "Debug mode: files live in memory");
        }

        let result = Self::event_loop(&mut terminal, &mut model, &mut bindings);

        bindings.teardown(TEARDOWN_GRACE);
        ratatui::restore();

        result
    }

    fn dispatch(model: &mut Model, bindings: &mut SessionBindings, msg: Message) {
        tracing::trace!(?msg, "message");
        *model = update(std::mem::take(model), msg);
        Self::handle_message_side_effects(model, bindings);
    }

    fn event_loop(
        terminal: &mut DefaultTerminal,
        model: &mut Model,
        bindings: &mut SessionBindings,
    ) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut needs_render = true;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            for msg in bindings.poll() {
                Self::dispatch(model, bindings, msg);
                needs_render = true;
            }

            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                Self::dispatch(model, bindings, Message::Resize(width, height));
                needs_render = true;
            }

            // Session tasks report through channels, so keep polling them
            // at a short interval while one is running.
            let poll_ms = if needs_render {
                0
            } else if model.is_busy() || resize_debouncer.is_pending() {
                10
            } else {
                100
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                // Coalesce key repeat bursts into a single render.
                loop {
                    let event_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    let msg =
                        Self::handle_event(&event::read()?, model, event_ms, &mut resize_debouncer);
                    if let Some(msg) = msg {
                        Self::dispatch(model, bindings, msg);
                        needs_render = true;
                    }
                    if model.should_quit || !event::poll(Duration::from_millis(0))? {
                        break;
                    }
                }
            }

            if needs_render {
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }
}
