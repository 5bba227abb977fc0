use crate::app::model::Task;
use crate::app::{App, Model, ToastLevel};

use super::bindings::SessionBindings;

impl App {
    /// Start whatever `update` parked in the model.
    pub(super) fn handle_message_side_effects(model: &mut Model, bindings: &mut SessionBindings) {
        match model.pending_task.take() {
            Some(Task::Open) => {
                tracing::debug!("dispatching open");
                bindings.spawn_open();
            }
            Some(Task::Save { revision }) => {
                tracing::debug!(revision, "dispatching save");
                bindings.spawn_save(revision);
            }
            None => {}
        }

        if let Some(reply) = model.pick_reply.take()
            && !bindings.answer_pick(reply)
        {
            model.show_toast(ToastLevel::Warning, "The file request is no longer pending");
        }
    }
}
