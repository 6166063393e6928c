//! Session replay: fold a recorded event log through the panel reducers.
//!
//! A session log is JSON lines. The first line is the board list the info
//! channel delivered; every following line is one per-board event in its
//! serde form:
//!
//! ```text
//! {"boards": [{"name": "wallhaven", "total_pages": 5}]}
//! {"board": "wallhaven", "event": {"type": "count_updated", "indexed_image_count": 42}}
//! ```
//!
//! Replaying applies the events through the exact reducers the live panel
//! uses, so a captured log reproduces the dashboard the operator saw.

use serde::Deserialize;

use crate::board::Imboard;
use crate::card::{CardEvent, CardState};
use crate::error::ReplayError;

/// One parsed log line.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Boards { boards: Vec<Imboard> },
    Event { board: String, event: CardEvent },
}

/// Replay a session log and return the final card states, in board-list
/// order.
///
/// A fresh board-list line mid-log re-seeds every card, the way a fresh
/// info join remounts the live panel's cards.
pub fn replay_session(input: &str) -> Result<Vec<CardState>, ReplayError> {
    let mut cards: Vec<CardState> = Vec::new();

    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let parsed: ReplayLine =
            serde_json::from_str(trimmed).map_err(|e| ReplayError::BadLine {
                line: line_no,
                reason: e.to_string(),
            })?;

        match parsed {
            ReplayLine::Boards { boards } => {
                cards = boards.into_iter().map(CardState::seeded).collect();
            }
            ReplayLine::Event { board, event } => {
                if cards.is_empty() {
                    return Err(ReplayError::MissingBoardList);
                }
                let card = cards
                    .iter_mut()
                    .find(|c| c.imboard.name == board)
                    .ok_or(ReplayError::UnknownBoard {
                        line: line_no,
                        board,
                    })?;
                card.apply(event);
            }
        }
    }

    Ok(cards)
}

/// Format card states as an aligned text dashboard.
pub fn render_table(cards: &[CardState]) -> String {
    let mut rows: Vec<[String; 5]> = vec![[
        "BOARD".to_string(),
        "INDEXED".to_string(),
        "PAGES".to_string(),
        "PROGRESS".to_string(),
        "INDEXING".to_string(),
    ]];

    for card in cards {
        let indexed = card
            .indexed_image_count
            .map_or("n/a".to_string(), |n| n.to_string());
        let progress = card
            .progress()
            .map_or("n/a".to_string(), |f| format!("{:.1}%", f * 100.0));
        let indexing = match card.is_indexing {
            Some(true) => "yes",
            Some(false) => "no",
            None => "?",
        };
        rows.push([
            card.imboard.name.clone(),
            indexed,
            card.imboard.total_pages.to_string(),
            progress,
            indexing.to_string(),
        ]);
    }

    let mut widths = [0usize; 5];
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, w)| format!("{cell:<w$}"))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}
