//! Per-board card state machine.
//!
//! Every mutation of a card's view state flows through [`CardState::apply`]
//! as a typed [`CardEvent`], in arrival order. The original admin page
//! scattered these transitions across channel callbacks; folding them into
//! one reducer gives the events a single, deterministic application point.

use serde::{Deserialize, Serialize};

use crate::board::{CountUpdate, Imboard, IndexingCommand, StatusSnapshot, progress_fraction};

/// Where a card is in its channel-join lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardPhase {
    /// Join issued, reply not yet received.
    Joining,
    /// Snapshot applied; live updates are flowing.
    Ready,
    /// The join was refused or the channel errored out.
    Failed(String),
}

/// View state for a single board card.
///
/// `indexed_image_count` and `is_indexing` stay unknown until the join
/// reply arrives; rendering must cope with both being absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardState {
    pub imboard: Imboard,
    pub phase: CardPhase,
    pub indexed_image_count: Option<u64>,
    pub is_indexing: Option<bool>,
    /// Command sent but not yet acknowledged by the backend.
    pub pending_command: Option<IndexingCommand>,
    /// Most recent command or channel error, for display.
    pub last_error: Option<String>,
}

/// Everything that can happen to a card after it mounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CardEvent {
    /// Join reply: the authoritative initial snapshot.
    JoinSucceeded(StatusSnapshot),
    /// Join refused by the backend.
    JoinFailed { reason: String },
    /// `board:info_updated`: wholesale replacement of the board record.
    MetadataUpdated(Imboard),
    /// `board:image_count_updated`: merge of the count field only.
    CountUpdated(CountUpdate),
    /// Operator clicked the toggle; command is on the wire.
    CommandSent { command: IndexingCommand },
    /// Backend accepted a start/stop command.
    CommandAcknowledged { command: IndexingCommand },
    /// Backend refused a start/stop command.
    CommandFailed { command: IndexingCommand, reason: String },
}

impl CardState {
    /// Seed a card from the board record the panel already holds, so name
    /// and page count render before the join reply arrives.
    pub fn seeded(imboard: Imboard) -> Self {
        Self {
            imboard,
            phase: CardPhase::Joining,
            indexed_image_count: None,
            is_indexing: None,
            pending_command: None,
            last_error: None,
        }
    }

    /// Apply one event. The only mutation path for card state.
    pub fn apply(&mut self, event: CardEvent) {
        match event {
            CardEvent::JoinSucceeded(snapshot) => {
                self.imboard = snapshot.imboard;
                self.indexed_image_count = Some(snapshot.indexed_image_count);
                self.is_indexing = Some(snapshot.is_indexing);
                self.phase = CardPhase::Ready;
            }
            CardEvent::JoinFailed { reason } => {
                self.phase = CardPhase::Failed(reason);
            }
            CardEvent::MetadataUpdated(imboard) => {
                self.imboard = imboard;
            }
            CardEvent::CountUpdated(update) => {
                self.indexed_image_count = Some(update.indexed_image_count);
            }
            CardEvent::CommandSent { command } => {
                self.pending_command = Some(command);
                self.last_error = None;
            }
            CardEvent::CommandAcknowledged { command } => {
                self.is_indexing = Some(command.acknowledged_state());
                self.pending_command = None;
            }
            CardEvent::CommandFailed { command, reason } => {
                self.pending_command = None;
                self.last_error = Some(format!("{command} indexing refused: {reason}"));
            }
        }
    }

    /// Indexing progress in `[0, 1]`, or `None` before it is computable.
    pub fn progress(&self) -> Option<f64> {
        progress_fraction(self.indexed_image_count, self.imboard.total_pages)
    }

    /// The command the toggle would send right now.
    ///
    /// An unknown flag is treated as "not indexing", so a card that never
    /// received its snapshot still offers a start action.
    pub fn toggle_command(&self) -> IndexingCommand {
        if self.is_indexing.unwrap_or(false) {
            IndexingCommand::Stop
        } else {
            IndexingCommand::Start
        }
    }
}
