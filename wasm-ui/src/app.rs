//! Admin panel controller component.
//!
//! Owns the shared socket. On mount it joins the info channel, receives the
//! board list, and renders one card per board; every card opens its own
//! channel on the same socket. Unmounting leaves all channels before the
//! connection closes.

use serde_json::Value;
use std::rc::Rc;
use yew::prelude::*;

use imboard_panel::channel::INFO_TOPIC;
use imboard_panel::{Imboard, PanelEvent, PanelPhase, PanelState, board_topic};

use crate::components::BoardCard;
use crate::socket::Socket;

/// Panel state as a Yew reducible: actions are the core panel events.
#[derive(Default, PartialEq)]
pub struct PanelViewState(pub PanelState);

impl Reducible for PanelViewState {
    type Action = PanelEvent;

    fn reduce(self: Rc<Self>, action: PanelEvent) -> Rc<Self> {
        let mut next = self.0.clone();
        next.apply(action);
        Rc::new(Self(next))
    }
}

/// Admin panel root component.
#[function_component(AdminPanel)]
pub fn admin_panel() -> Html {
    let panel = use_reducer(PanelViewState::default);
    let socket = use_memo((), |_| Socket::connect());

    {
        let panel = panel.clone();
        let socket = socket.clone();
        use_effect_with((), move |_| {
            let mut cleanup: Box<dyn FnOnce()> = Box::new(|| {});
            match &*socket {
                Ok(socket) => {
                    let on_close = {
                        let panel = panel.clone();
                        Callback::from(move |reason: String| {
                            panel.dispatch(PanelEvent::SocketClosed { reason });
                        })
                    };
                    socket.set_on_close(on_close);

                    let on_reply = {
                        let panel = panel.clone();
                        Callback::from(move |reply: Result<Value, String>| {
                            let event = match reply {
                                Ok(payload) => {
                                    match serde_json::from_value::<Vec<Imboard>>(payload) {
                                        Ok(boards) => PanelEvent::InfoJoined { boards },
                                        Err(e) => PanelEvent::InfoJoinFailed {
                                            reason: format!("bad board list: {e}"),
                                        },
                                    }
                                }
                                Err(reason) => PanelEvent::InfoJoinFailed { reason },
                            };
                            panel.dispatch(event);
                        })
                    };
                    socket.channel(INFO_TOPIC).join(on_reply);

                    let socket = socket.clone();
                    cleanup = Box::new(move || socket.disconnect());
                }
                Err(reason) => {
                    panel.dispatch(PanelEvent::SocketClosed {
                        reason: reason.clone(),
                    });
                }
            }
            cleanup
        });
    }

    let content = match &panel.0.phase {
        PanelPhase::Connecting => html! {
            <div class="panel-status">{ "Connecting to the indexer…" }</div>
        },
        PanelPhase::Failed(reason) => html! {
            <div class="alert alert-danger" role="alert">
                { format!("Admin panel unavailable: {reason}") }
            </div>
        },
        PanelPhase::Ready => {
            let cards = panel.0.boards.iter().map(|board| {
                let channel = match &*socket {
                    Ok(socket) => socket.channel(board_topic(&board.name)),
                    // Unreachable once Ready, but renders an inert card
                    // rather than panicking if it ever is.
                    Err(_) => return html! {},
                };
                html! {
                    <BoardCard
                        key={board.name.clone()}
                        imboard={board.clone()}
                        channel={channel}
                    />
                }
            });
            html! {
                <div class="card-group">
                    { for cards }
                </div>
            }
        }
    };

    html! {
        <div class="admin-panel">
            <header class="header">
                <h1>{ "Imageboard indexing" }</h1>
                <p class="subtitle">{ "Live status and controls per board" }</p>
            </header>

            <main class="main">
                { content }
            </main>

            <footer class="footer">
                <span>
                    { format!("Build: {} {}", env!("BUILD_COMMIT"), env!("BUILD_TIMESTAMP")) }
                </span>
            </footer>
        </div>
    }
}
