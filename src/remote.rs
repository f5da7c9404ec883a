// Remote control of the active counter (notification actions, widgets).
use std::str::FromStr;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    Increment,
    Decrement,
}

impl FromStr for RemoteCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increment" => Ok(RemoteCommand::Increment),
            "decrement" => Ok(RemoteCommand::Decrement),
            other => Err(anyhow::anyhow!("Unknown remote action: {}", other)),
        }
    }
}

/// Fire-and-forget sender handed to whatever receives the external trigger.
#[derive(Debug, Clone)]
pub struct RemoteControl {
    tx: UnboundedSender<RemoteCommand>,
}

impl RemoteControl {
    pub fn send(&self, command: RemoteCommand) {
        if self.tx.send(command).is_err() {
            log::debug!("Remote command {:?} dropped: counters closed", command);
        }
    }

    /// Parses a raw action string and posts it. Unknown actions are ignored.
    pub fn send_action(&self, action: &str) -> bool {
        match action.parse::<RemoteCommand>() {
            Ok(command) => {
                self.send(command);
                true
            }
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        }
    }
}

pub(crate) fn channel() -> (RemoteControl, UnboundedReceiver<RemoteCommand>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RemoteControl { tx }, rx)
}
