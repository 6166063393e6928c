//! Card component for one board's live status and controls.

use serde_json::Value;
use std::rc::Rc;
use yew::prelude::*;

use gloo::console;
use imboard_panel::channel::{EVENT_COUNT_UPDATED, EVENT_INFO_UPDATED};
use imboard_panel::{
    CardEvent, CardPhase, CardState, CountUpdate, IMAGES_PER_PAGE, Imboard, IndexingCommand,
    StatusSnapshot,
};

use crate::socket::Channel;

/// Card state as a Yew reducible: actions are the core card events.
#[derive(PartialEq)]
pub struct CardViewState(pub CardState);

impl Reducible for CardViewState {
    type Action = CardEvent;

    fn reduce(self: Rc<Self>, action: CardEvent) -> Rc<Self> {
        let mut next = self.0.clone();
        next.apply(action);
        Rc::new(Self(next))
    }
}

#[derive(Properties, PartialEq)]
pub struct BoardCardProps {
    /// Board record from the panel's list; seeds the view before the
    /// channel snapshot arrives.
    pub imboard: Imboard,
    /// This board's own channel on the shared socket.
    pub channel: Channel,
}

#[function_component(BoardCard)]
pub fn board_card(props: &BoardCardProps) -> Html {
    let state = use_reducer({
        let seed = props.imboard.clone();
        move || CardViewState(CardState::seeded(seed))
    });

    {
        let state = state.clone();
        use_effect_with(props.channel.clone(), move |channel| {
            let on_join = {
                let state = state.clone();
                Callback::from(move |reply: Result<Value, String>| {
                    let event = match reply {
                        Ok(payload) => match serde_json::from_value::<StatusSnapshot>(payload) {
                            Ok(snapshot) => CardEvent::JoinSucceeded(snapshot),
                            Err(e) => CardEvent::JoinFailed {
                                reason: format!("bad status snapshot: {e}"),
                            },
                        },
                        Err(reason) => CardEvent::JoinFailed { reason },
                    };
                    state.dispatch(event);
                })
            };
            channel.join(on_join);

            let on_metadata = {
                let state = state.clone();
                Callback::from(move |payload: Value| {
                    match serde_json::from_value::<Imboard>(payload) {
                        Ok(imboard) => state.dispatch(CardEvent::MetadataUpdated(imboard)),
                        Err(e) => console::warn!(format!("discarding board update: {e}")),
                    }
                })
            };
            channel.on(EVENT_INFO_UPDATED, on_metadata);

            let on_count = {
                let state = state.clone();
                Callback::from(move |payload: Value| {
                    match serde_json::from_value::<CountUpdate>(payload) {
                        Ok(update) => state.dispatch(CardEvent::CountUpdated(update)),
                        Err(e) => console::warn!(format!("discarding count update: {e}")),
                    }
                })
            };
            channel.on(EVENT_COUNT_UPDATED, on_count);

            let channel = channel.clone();
            move || channel.leave()
        });
    }

    let on_toggle = {
        let state = state.clone();
        let channel = props.channel.clone();
        Callback::from(move |_: MouseEvent| {
            let command = state.0.toggle_command();
            state.dispatch(CardEvent::CommandSent { command });
            let on_reply = {
                let state = state.clone();
                Callback::from(move |reply: Result<Value, String>| {
                    let event = match reply {
                        Ok(_) => CardEvent::CommandAcknowledged { command },
                        Err(reason) => CardEvent::CommandFailed { command, reason },
                    };
                    state.dispatch(event);
                })
            };
            channel.push(command.event(), on_reply);
        })
    };

    let card = &state.0;
    let indexed = card
        .indexed_image_count
        .map_or_else(|| "n/a".to_string(), |n| n.to_string());
    let capacity = card.imboard.total_pages * IMAGES_PER_PAGE;
    let bar_width = card.progress().unwrap_or(0.0) * 100.0;

    html! {
        <div class="card imboard-card">
            <div class="card-header">
                { &card.imboard.name }
            </div>
            <div class="card-body">
                if let CardPhase::Failed(reason) = &card.phase {
                    <div class="alert alert-warning" role="alert">
                        { format!("Live status unavailable: {reason}") }
                    </div>
                }

                <h5>{ "Properties" }</h5>
                <ul class="list-group">
                    <li class="list-group-item">
                        <b>{ "Images indexed" }</b>{ ": " }{ &indexed }
                    </li>
                    <li class="list-group-item">
                        <b>{ "Total pages" }</b>{ ": " }{ card.imboard.total_pages }
                    </li>
                </ul>

                <br />

                <h5>{ "Indexing progress" }</h5>
                <b>{ format!("({indexed} / {capacity})") }</b>
                <div class="progress">
                    <div class="progress-bar"
                         role="progressbar"
                         style={format!("width: {bar_width}%")}>
                    </div>
                </div>

                <br />

                <ToggleButton
                    is_indexing={card.is_indexing.unwrap_or(false)}
                    pending={card.pending_command}
                    on_toggle={on_toggle}
                />

                if let Some(error) = &card.last_error {
                    <p class="text-danger command-error">{ error }</p>
                }
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct ToggleButtonProps {
    pub is_indexing: bool,
    pub pending: Option<IndexingCommand>,
    pub on_toggle: Callback<MouseEvent>,
}

/// Start/stop control. Label and style are a pure function of the
/// indexing flag; the button is held disabled while a command awaits its
/// acknowledgment.
#[function_component(ToggleButton)]
pub fn toggle_button(props: &ToggleButtonProps) -> Html {
    let class = if props.is_indexing {
        "btn btn-danger"
    } else {
        "btn btn-primary"
    };
    let label = match props.pending {
        Some(IndexingCommand::Start) => "Starting indexing",
        Some(IndexingCommand::Stop) => "Stopping indexing",
        None if props.is_indexing => "Stop indexing",
        None => "Start indexing",
    };

    html! {
        <button class={class} disabled={props.pending.is_some()} onclick={props.on_toggle.clone()}>
            { label }
        </button>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    fn seeded() -> Rc<CardViewState> {
        Rc::new(CardViewState(CardState::seeded(Imboard {
            name: "wallhaven".to_string(),
            total_pages: 5,
        })))
    }

    #[wasm_bindgen_test]
    fn reduce_applies_snapshot() {
        let state = seeded().reduce(CardEvent::JoinSucceeded(StatusSnapshot {
            indexed_image_count: 120,
            is_indexing: false,
            imboard: Imboard {
                name: "wallhaven".to_string(),
                total_pages: 5,
            },
        }));
        assert_eq!(state.0.indexed_image_count, Some(120));
        assert_eq!(state.0.phase, CardPhase::Ready);
    }

    #[wasm_bindgen_test]
    fn reduce_does_not_mutate_previous_state() {
        let first = seeded();
        let second = first.clone().reduce(CardEvent::CountUpdated(CountUpdate {
            indexed_image_count: 7,
        }));
        assert_eq!(first.0.indexed_image_count, None);
        assert_eq!(second.0.indexed_image_count, Some(7));
    }
}
