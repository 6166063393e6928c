//! Browser-side channel transport.
//!
//! One WebSocket carries every channel of the admin surface. A single
//! spawned task owns the socket: it pumps queued outbound frames and feeds
//! inbound text through the core [`SocketClient`], which routes replies to
//! their registered callbacks and pushes to per-(topic, event) subscribers.
//! Components never touch the socket directly; they hold [`Channel`]
//! handles scoped to one topic.
//!
//! Shutdown order matters: [`Socket::disconnect`] queues a leave frame for
//! every joined topic and then closes the outbound queue, so the task
//! flushes the leaves before it closes the underlying connection.

use futures::channel::mpsc;
use futures::{SinkExt, StreamExt, select};
use gloo::console;
use gloo::net::websocket::{Message, futures::WebSocket};
use gloo::timers::callback::Interval;
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use wasm_bindgen_futures::spawn_local;
use yew::Callback;

use imboard_panel::channel::{Frame, Inbound, SocketClient};

/// Fixed endpoint path of the admin socket, joined to the page's own host.
const SOCKET_PATH: &str = "/admin_panel_socket/websocket?vsn=2.0";

/// Heartbeat period in milliseconds.
const HEARTBEAT_MS: u32 = 30_000;

/// Reply callbacks receive the reply response on success or a displayable
/// reason on an error reply.
pub type ReplyCallback = Callback<Result<Value, String>>;

struct SocketInner {
    client: RefCell<SocketClient>,
    outbound: mpsc::UnboundedSender<String>,
    handlers: RefCell<HashMap<(String, String), Callback<Value>>>,
    replies: RefCell<HashMap<u64, ReplyCallback>>,
    on_close: RefCell<Option<Callback<String>>>,
    heartbeat: RefCell<Option<Interval>>,
}

/// Shared handle to the admin connection.
#[derive(Clone)]
pub struct Socket {
    inner: Rc<SocketInner>,
}

impl PartialEq for Socket {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Socket {
    /// Open the admin socket against the current page's host.
    pub fn connect() -> Result<Self, String> {
        let url = socket_url()?;
        let ws = WebSocket::open(&url).map_err(|e| e.to_string())?;
        let (outbound_tx, outbound_rx) = mpsc::unbounded();

        let inner = Rc::new(SocketInner {
            client: RefCell::new(SocketClient::new()),
            outbound: outbound_tx,
            handlers: RefCell::new(HashMap::new()),
            replies: RefCell::new(HashMap::new()),
            on_close: RefCell::new(None),
            heartbeat: RefCell::new(None),
        });
        let socket = Self {
            inner: inner.clone(),
        };

        let beat = {
            let weak = Rc::downgrade(&inner);
            Interval::new(HEARTBEAT_MS, move || {
                if let Some(inner) = weak.upgrade() {
                    let frame = inner.client.borrow_mut().heartbeat();
                    let _ = inner.outbound.unbounded_send(frame.encode());
                }
            })
        };
        *inner.heartbeat.borrow_mut() = Some(beat);

        spawn_local(run_socket(ws, outbound_rx, Rc::downgrade(&inner)));
        Ok(socket)
    }

    /// Handle for one named channel. Cheap; no traffic until `join`.
    pub fn channel(&self, topic: impl Into<String>) -> Channel {
        Channel {
            socket: self.clone(),
            topic: topic.into(),
        }
    }

    /// Register the callback invoked when the connection drops.
    pub fn set_on_close(&self, callback: Callback<String>) {
        *self.inner.on_close.borrow_mut() = Some(callback);
    }

    /// Leave every joined channel, then close the connection.
    pub fn disconnect(&self) {
        self.inner.heartbeat.borrow_mut().take();
        self.inner.replies.borrow_mut().clear();
        self.inner.handlers.borrow_mut().clear();
        self.inner.on_close.borrow_mut().take();
        let frames = self.inner.client.borrow_mut().shutdown();
        for frame in frames {
            self.send_frame(frame);
        }
        // End of the outbound stream; the socket task flushes what is
        // queued (the leaves above) and then closes the transport.
        self.inner.outbound.close_channel();
    }

    fn send_frame(&self, frame: Frame) {
        if self.inner.outbound.unbounded_send(frame.encode()).is_err() {
            console::warn!("dropping frame: socket task is gone");
        }
    }
}

/// Handle to one channel topic on the shared socket.
#[derive(Clone)]
pub struct Channel {
    socket: Socket,
    topic: String,
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        self.topic == other.topic && self.socket == other.socket
    }
}

impl Channel {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Join the topic with an empty payload; `on_reply` receives the
    /// initial snapshot or the refusal reason.
    pub fn join(&self, on_reply: ReplyCallback) {
        let frame = self
            .socket
            .inner
            .client
            .borrow_mut()
            .join(&self.topic, json!({}));
        if let Some(msg_ref) = frame.msg_ref {
            self.socket.inner.replies.borrow_mut().insert(msg_ref, on_reply);
        }
        self.socket.send_frame(frame);
    }

    /// Subscribe to one push event on this topic.
    pub fn on(&self, event: &str, callback: Callback<Value>) {
        self.socket
            .inner
            .handlers
            .borrow_mut()
            .insert((self.topic.clone(), event.to_string()), callback);
    }

    /// Send a command with an empty payload; `on_reply` fires on the
    /// acknowledgment. No acknowledgment, no callback.
    pub fn push(&self, event: &str, on_reply: ReplyCallback) {
        let frame = self
            .socket
            .inner
            .client
            .borrow_mut()
            .push(&self.topic, event, json!({}));
        if let Some(msg_ref) = frame.msg_ref {
            self.socket.inner.replies.borrow_mut().insert(msg_ref, on_reply);
        }
        self.socket.send_frame(frame);
    }

    /// Leave the topic and drop its subscribers and any replies still in
    /// flight, so nothing resolved after this point reaches a component.
    pub fn leave(&self) {
        let left = self.socket.inner.client.borrow_mut().leave(&self.topic);
        let Some((frame, cancelled)) = left else {
            return;
        };
        {
            let mut replies = self.socket.inner.replies.borrow_mut();
            for msg_ref in cancelled {
                replies.remove(&msg_ref);
            }
        }
        self.socket
            .inner
            .handlers
            .borrow_mut()
            .retain(|(topic, _), _| topic != &self.topic);
        self.socket.send_frame(frame);
    }
}

impl SocketInner {
    fn dispatch(&self, text: &str) {
        let frame = match Frame::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                console::warn!(format!("discarding malformed frame: {e}"));
                return;
            }
        };
        let inbound = match self.client.borrow_mut().classify(frame) {
            Ok(inbound) => inbound,
            Err(e) => {
                console::warn!(format!("discarding unroutable frame: {e}"));
                return;
            }
        };
        match inbound {
            Inbound::Reply {
                msg_ref,
                status,
                response,
                ..
            } => {
                let callback = self.replies.borrow_mut().remove(&msg_ref);
                if let Some(callback) = callback {
                    if status.is_ok() {
                        callback.emit(Ok(response));
                    } else {
                        callback.emit(Err(reply_reason(&response)));
                    }
                }
            }
            Inbound::Event {
                topic,
                event,
                payload,
            } => {
                let callback = self.handlers.borrow().get(&(topic, event)).cloned();
                if let Some(callback) = callback {
                    callback.emit(payload);
                }
            }
            Inbound::Closed { topic } => {
                console::warn!(format!("channel closed by server: {topic}"));
                self.handlers
                    .borrow_mut()
                    .retain(|(t, _), _| t != &topic);
            }
            Inbound::Ignored => {}
        }
    }

    fn notify_closed(&self, reason: &str) {
        let callback = self.on_close.borrow().clone();
        if let Some(callback) = callback {
            callback.emit(reason.to_string());
        }
    }
}

/// Socket task: pump outbound frames, dispatch inbound ones.
async fn run_socket(
    ws: WebSocket,
    mut outbound: mpsc::UnboundedReceiver<String>,
    inner: Weak<SocketInner>,
) {
    let mut ws = ws.fuse();
    loop {
        select! {
            out = outbound.next() => match out {
                Some(text) => {
                    if let Err(e) = ws.send(Message::Text(text)).await {
                        console::error!(format!("socket send failed: {e:?}"));
                        if let Some(inner) = inner.upgrade() {
                            inner.notify_closed("send failed");
                        }
                        break;
                    }
                }
                // Client-initiated shutdown: queue drained, close below.
                None => break,
            },
            msg = ws.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let Some(inner) = inner.upgrade() else { break };
                    inner.dispatch(&text);
                }
                Some(Ok(Message::Bytes(_))) => {}
                Some(Err(e)) => {
                    console::error!(format!("socket error: {e:?}"));
                    if let Some(inner) = inner.upgrade() {
                        inner.notify_closed("connection error");
                    }
                    break;
                }
                None => {
                    if let Some(inner) = inner.upgrade() {
                        inner.notify_closed("connection closed");
                    }
                    break;
                }
            },
        }
    }
    let _ = ws.into_inner().close(Some(1000), Some("panel shutdown"));
}

/// Displayable reason out of an error-reply response.
fn reply_reason(response: &Value) -> String {
    response
        .get("reason")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| response.to_string())
}

fn socket_url() -> Result<String, String> {
    let location = gloo::utils::window().location();
    let protocol = location
        .protocol()
        .map_err(|_| "page location has no protocol".to_string())?;
    let host = location
        .host()
        .map_err(|_| "page location has no host".to_string())?;
    let scheme = if protocol == "https:" { "wss" } else { "ws" };
    Ok(format!("{scheme}://{host}{SOCKET_PATH}"))
}
