//! CLI tool to replay a recorded admin session log.
//!
//! Reads a JSON-lines session log (a board list followed by per-board
//! events) and prints the dashboard an operator would have seen at the end
//! of the session. Useful for inspecting captured channel traffic without
//! a browser.

use clap::Parser;
use imboard_panel::{render_table, replay_session};
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "panel-replay", about = "Replay a recorded admin session log")]
struct Cli {
    /// Session log file (JSON lines).
    log: PathBuf,

    /// Also print each card's full state as JSON after the table.
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let input = match fs::read_to_string(&cli.log) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading session log '{}': {}", cli.log.display(), e);
            process::exit(1);
        }
    };

    let cards = match replay_session(&input) {
        Ok(cards) => cards,
        Err(e) => {
            eprintln!("Replay error: {e}");
            process::exit(1);
        }
    };

    print!("{}", render_table(&cards));

    if cli.verbose {
        for card in &cards {
            match serde_json::to_string_pretty(card) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing card state: {e}");
                    process::exit(1);
                }
            }
        }
    }

    eprintln!("Replayed {} board(s)", cards.len());
}
