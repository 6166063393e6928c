//! Imageboard data model and indexing-progress math.
//!
//! The backend reports each board's size in pages; the indexer reports how
//! many individual images it has stored. Progress is the ratio of the two,
//! with the page size folded in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Images per listing page across the supported imageboards.
///
/// TODO: the backend should report this per board; every board indexed so
/// far paginates 100 images per page, so the value is a constant for now.
pub const IMAGES_PER_PAGE: u64 = 100;

/// One indexable content source as the backend describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Imboard {
    /// Unique board name; doubles as the card identity key.
    pub name: String,
    /// Page count reported by the board itself.
    #[serde(default)]
    pub total_pages: u64,
}

/// Status snapshot delivered when a board channel is joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub indexed_image_count: u64,
    pub is_indexing: bool,
    pub imboard: Imboard,
}

/// Payload of a `board:image_count_updated` push.
///
/// Carries only the count; the rest of the card state is untouched when it
/// is merged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountUpdate {
    pub indexed_image_count: u64,
}

/// The two commands an operator can send to a board's indexing process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingCommand {
    Start,
    Stop,
}

impl IndexingCommand {
    /// Channel event name for this command.
    pub fn event(self) -> &'static str {
        match self {
            IndexingCommand::Start => "indexing:start",
            IndexingCommand::Stop => "indexing:stop",
        }
    }

    /// Value `is_indexing` takes once the backend acknowledges the command.
    pub fn acknowledged_state(self) -> bool {
        matches!(self, IndexingCommand::Start)
    }
}

impl fmt::Display for IndexingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexingCommand::Start => write!(f, "start"),
            IndexingCommand::Stop => write!(f, "stop"),
        }
    }
}

/// Indexing progress as a fraction of the board's image capacity.
///
/// Returns `None` until a count is known and the board reports a non-zero
/// page count. Counts beyond capacity clamp to 1.
pub fn progress_fraction(indexed_image_count: Option<u64>, total_pages: u64) -> Option<f64> {
    let count = indexed_image_count?;
    let capacity = total_pages.checked_mul(IMAGES_PER_PAGE)?;
    if capacity == 0 {
        return None;
    }
    Some((count as f64 / capacity as f64).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_in_range_for_valid_counts() {
        for count in [0, 1, 250, 499, 500] {
            let fraction = progress_fraction(Some(count), 5).unwrap();
            assert!(
                (0.0..=1.0).contains(&fraction),
                "count {count} produced fraction {fraction}"
            );
        }
    }

    #[test]
    fn test_progress_half_way() {
        assert_eq!(progress_fraction(Some(250), 5), Some(0.5));
    }

    #[test]
    fn test_progress_clamps_overflowing_count() {
        assert_eq!(progress_fraction(Some(9_999), 5), Some(1.0));
    }

    #[test]
    fn test_progress_unknown_count() {
        assert_eq!(progress_fraction(None, 5), None);
    }

    #[test]
    fn test_progress_zero_pages() {
        assert_eq!(progress_fraction(Some(42), 0), None);
    }

    #[test]
    fn test_imboard_ignores_unknown_fields() {
        let board: Imboard =
            serde_json::from_str(r#"{"name":"wallhaven","total_pages":7,"homepage":"x"}"#).unwrap();
        assert_eq!(board.name, "wallhaven");
        assert_eq!(board.total_pages, 7);
    }

    #[test]
    fn test_command_events() {
        assert_eq!(IndexingCommand::Start.event(), "indexing:start");
        assert_eq!(IndexingCommand::Stop.event(), "indexing:stop");
        assert!(IndexingCommand::Start.acknowledged_state());
        assert!(!IndexingCommand::Stop.acknowledged_state());
    }
}
