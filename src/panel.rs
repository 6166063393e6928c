//! Panel-level state: the board list and the connection lifecycle.

use serde::{Deserialize, Serialize};

use crate::board::Imboard;

/// Where the panel is in its info-channel lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelPhase {
    /// Socket opened, info join in flight.
    Connecting,
    /// Board list received; cards are rendering.
    Ready,
    /// Info join refused or the socket dropped.
    Failed(String),
}

/// View state for the panel controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelState {
    pub phase: PanelPhase,
    /// Board records exactly as the info join delivered them; card identity
    /// is the board name.
    pub boards: Vec<Imboard>,
}

/// Panel-level events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelEvent {
    /// Info join reply: the ordered board list.
    InfoJoined { boards: Vec<Imboard> },
    /// Info join refused.
    InfoJoinFailed { reason: String },
    /// The underlying connection closed or errored.
    SocketClosed { reason: String },
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            phase: PanelPhase::Connecting,
            boards: Vec::new(),
        }
    }
}

impl PanelState {
    /// Apply one event. The only mutation path for panel state.
    pub fn apply(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::InfoJoined { boards } => {
                self.boards = boards;
                self.phase = PanelPhase::Ready;
            }
            PanelEvent::InfoJoinFailed { reason } => {
                self.phase = PanelPhase::Failed(reason);
            }
            PanelEvent::SocketClosed { reason } => {
                self.phase = PanelPhase::Failed(reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(name: &str) -> Imboard {
        Imboard {
            name: name.to_string(),
            total_pages: 1,
        }
    }

    #[test]
    fn test_info_join_stores_list_verbatim() {
        let mut panel = PanelState::default();
        assert_eq!(panel.phase, PanelPhase::Connecting);

        panel.apply(PanelEvent::InfoJoined {
            boards: vec![board("wallhaven"), board("gelbooru"), board("danbooru")],
        });

        assert_eq!(panel.phase, PanelPhase::Ready);
        assert_eq!(panel.boards.len(), 3);
        let names: Vec<&str> = panel.boards.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["wallhaven", "gelbooru", "danbooru"]);
    }

    #[test]
    fn test_card_keys_are_distinct() {
        let mut panel = PanelState::default();
        panel.apply(PanelEvent::InfoJoined {
            boards: vec![board("a"), board("b"), board("c")],
        });
        let mut names: Vec<&str> = panel.boards.iter().map(|b| b.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), panel.boards.len());
    }

    #[test]
    fn test_join_failure_is_visible() {
        let mut panel = PanelState::default();
        panel.apply(PanelEvent::InfoJoinFailed {
            reason: "timeout".to_string(),
        });
        assert_eq!(panel.phase, PanelPhase::Failed("timeout".to_string()));
        assert!(panel.boards.is_empty());
    }

    #[test]
    fn test_socket_drop_after_ready() {
        let mut panel = PanelState::default();
        panel.apply(PanelEvent::InfoJoined {
            boards: vec![board("wallhaven")],
        });
        panel.apply(PanelEvent::SocketClosed {
            reason: "connection lost".to_string(),
        });
        assert_eq!(panel.phase, PanelPhase::Failed("connection lost".to_string()));
        // The last known list survives for display alongside the banner.
        assert_eq!(panel.boards.len(), 1);
    }
}
