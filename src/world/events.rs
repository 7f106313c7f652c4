use crate::interaction::{ActionEvent, Interaction};
use crate::world::position::Position;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Where a transition lands. `world_file` is set only when it leaves the
/// current world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub coordinates: Position,
    pub world_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    WorldLoaded { name: String },
    Moved { position: Position },
    /// `None` clears the current interaction.
    Interaction(Option<Box<Interaction>>),
    Destination(Destination),
    Locked { target: Position, text: String },
    ZoneChanged { overlay_file: Option<String> },
    Action(ActionEvent),
}

/// Publishes session events to whoever holds the receiver.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: mpsc::UnboundedSender<GameEvent>,
}

impl EventDispatcher {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<GameEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: GameEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("event receiver dropped");
        }
    }
}

/// Drains everything currently queued without waiting.
pub fn drain(receiver: &mut mpsc::UnboundedReceiver<GameEvent>) -> Vec<GameEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}
