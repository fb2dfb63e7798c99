use crate::command::Command;
use crate::transport::Transport;
use std::sync::Arc;

/// Best-effort sender. A command that fails to go out is logged and
/// dropped; the next control input supersedes it.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn dispatch(&self, command: &Command) {
        tracing::trace!("[{}] dispatch {}", command.camera(), command);
        if let Err(err) = self.transport.send_text(command.as_str()) {
            tracing::warn!(
                "[{}] failed to send {}: {}",
                command.camera(),
                command.fragment(),
                err
            );
        }
    }
}
