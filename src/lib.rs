//! # imboard-panel
//!
//! Channel-driven view state for the admin surface of an imageboard
//! indexer.
//!
//! The backend tracks a set of imageboards and runs an indexing process per
//! board; this crate holds everything the operator-facing clients need to
//! mirror that state: the board data model, the channel wire codec and
//! client bookkeeping, one reducer per board card and one for the panel,
//! the image-record model of the HTTP API, and a replay facility for
//! recorded sessions. All of it is I/O-free; the `wasm-ui` workspace member
//! supplies the browser transport and rendering on top.
//!
//! ## Example
//!
//! ```
//! use imboard_panel::{CardEvent, CardState, CountUpdate, Imboard};
//!
//! let mut card = CardState::seeded(Imboard {
//!     name: "wallhaven".to_string(),
//!     total_pages: 5,
//! });
//!
//! // Nothing is known before the join reply; rendering still works.
//! assert_eq!(card.progress(), None);
//!
//! card.apply(CardEvent::CountUpdated(CountUpdate {
//!     indexed_image_count: 250,
//! }));
//! assert_eq!(card.progress(), Some(0.5));
//! ```

pub mod board;
pub mod card;
pub mod channel;
pub mod error;
pub mod image;
pub mod panel;
pub mod replay;

pub use board::{
    CountUpdate, IMAGES_PER_PAGE, Imboard, IndexingCommand, StatusSnapshot, progress_fraction,
};
pub use card::{CardEvent, CardPhase, CardState};
pub use channel::{Frame, Inbound, ReplyStatus, SocketClient, board_topic};
pub use error::{ChannelError, ReplayError};
pub use image::{ImageEnvelope, ImageRecord, image_endpoint, image_id_from_path};
pub use panel::{PanelEvent, PanelPhase, PanelState};
pub use replay::{render_table, replay_session};
