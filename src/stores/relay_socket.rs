//! Shared WebSocket to the caching service
//!
//! One connection serves every profile query. Consumers register a named
//! listener and receive every text frame on an unbounded channel; registering
//! the same name again replaces the previous sender, so reconnect handlers can
//! re-register without stacking up duplicates.
//!
//! Lifecycle follows the mint socket:
//! - No Closure::forget() - closures stored for explicit cleanup
//! - Explicit disconnect() for resource cleanup

use std::cell::RefCell;
use std::collections::HashMap;
use dioxus::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, ErrorEvent, MessageEvent, WebSocket};
use tokio::sync::mpsc;

use crate::stores::profile::requests::close_frame;
use crate::stores::profile::{ProfileError, ProfileRequest, ProfileResult, RequestSink};

/// Whether the socket is open; components react to changes
pub static SOCKET_CONNECTED: GlobalSignal<bool> = Signal::global(|| false);

// Closures aren't Clone, so they live in thread_local storage next to the socket
thread_local! {
    static SOCKET: RefCell<Option<SocketHandle>> = const { RefCell::new(None) };
    static LISTENERS: RefCell<HashMap<String, mpsc::UnboundedSender<String>>> = RefCell::new(HashMap::new());
}

struct SocketHandle {
    ws: WebSocket,
    url: String,
    #[allow(dead_code)]
    onopen: Closure<dyn FnMut(web_sys::Event)>,
    #[allow(dead_code)]
    onmessage: Closure<dyn FnMut(MessageEvent)>,
    #[allow(dead_code)]
    onerror: Closure<dyn FnMut(ErrorEvent)>,
    #[allow(dead_code)]
    onclose: Closure<dyn FnMut(CloseEvent)>,
}

// =============================================================================
// Listeners
// =============================================================================

/// Register `sender` under `name`, replacing any previous registration
pub fn add_listener(name: &str, sender: mpsc::UnboundedSender<String>) {
    LISTENERS.with(|listeners| {
        if listeners.borrow_mut().insert(name.to_string(), sender).is_some() {
            log::debug!("Replaced socket listener {}", name);
        } else {
            log::debug!("Added socket listener {}", name);
        }
    });
}

pub fn remove_listener(name: &str) {
    LISTENERS.with(|listeners| {
        if listeners.borrow_mut().remove(name).is_some() {
            log::debug!("Removed socket listener {}", name);
        }
    });
}

#[cfg(test)]
fn listener_count() -> usize {
    LISTENERS.with(|listeners| listeners.borrow().len())
}

/// Hand a frame to every listener, dropping those whose receiver is gone
fn dispatch(text: &str) {
    LISTENERS.with(|listeners| {
        listeners.borrow_mut().retain(|name, sender| {
            let alive = sender.send(text.to_string()).is_ok();
            if !alive {
                log::debug!("Socket listener {} went away", name);
            }
            alive
        });
    });
}

// =============================================================================
// Connection
// =============================================================================

/// Open the socket to `url`, closing any previous connection
pub fn connect(url: &str) -> ProfileResult<()> {
    disconnect();

    let ws = WebSocket::new(url).map_err(|e| ProfileError::Transport(format!("{:?}", e)))?;
    ws.set_binary_type(web_sys::BinaryType::Arraybuffer);

    let url_for_open = url.to_string();
    let onopen = Closure::wrap(Box::new(move |_: web_sys::Event| {
        log::info!("Cache socket connected to {}", url_for_open);
        *SOCKET_CONNECTED.write() = true;
    }) as Box<dyn FnMut(web_sys::Event)>);
    ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));

    let onmessage = Closure::wrap(Box::new(move |e: MessageEvent| {
        if let Ok(text) = e.data().dyn_into::<js_sys::JsString>() {
            let text: String = text.into();
            dispatch(&text);
        } else {
            log::debug!("Ignoring non-text frame from cache socket");
        }
    }) as Box<dyn FnMut(MessageEvent)>);
    ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

    let url_for_error = url.to_string();
    let onerror = Closure::wrap(Box::new(move |e: ErrorEvent| {
        log::error!("Cache socket error for {}: {:?}", url_for_error, e.message());
    }) as Box<dyn FnMut(ErrorEvent)>);
    ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));

    let url_for_close = url.to_string();
    let onclose = Closure::wrap(Box::new(move |e: CloseEvent| {
        log::info!("Cache socket closed for {}: code={}, reason={}", url_for_close, e.code(), e.reason());
        *SOCKET_CONNECTED.write() = false;
    }) as Box<dyn FnMut(CloseEvent)>);
    ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

    SOCKET.with(|socket| {
        *socket.borrow_mut() = Some(SocketHandle {
            ws,
            url: url.to_string(),
            onopen,
            onmessage,
            onerror,
            onclose,
        });
    });

    Ok(())
}

/// Close the socket and drop its closures
pub fn disconnect() {
    let Some(handle) = SOCKET.with(|socket| socket.borrow_mut().take()) else {
        return;
    };

    // Detach before the closures drop with the handle
    handle.ws.set_onopen(None);
    handle.ws.set_onmessage(None);
    handle.ws.set_onerror(None);
    handle.ws.set_onclose(None);
    if let Err(e) = handle.ws.close() {
        log::error!("Failed to close cache socket for {}: {:?}", handle.url, e);
    }
    *SOCKET_CONNECTED.write() = false;

    log::info!("Cleaned up cache socket for {}", handle.url);
}

/// No socket, or the last one has closed
pub fn needs_reconnect() -> bool {
    SOCKET.with(|socket| {
        socket
            .borrow()
            .as_ref()
            .map(|handle| handle.ws.ready_state() == WebSocket::CLOSED)
            .unwrap_or(true)
    })
}

/// Send a text frame
pub fn send_frame(text: &str) -> ProfileResult<()> {
    SOCKET.with(|socket| {
        let socket = socket.borrow();
        let handle = socket.as_ref().ok_or(ProfileError::NotConnected)?;
        if handle.ws.ready_state() != WebSocket::OPEN {
            return Err(ProfileError::NotConnected);
        }
        handle
            .ws
            .send_with_str(text)
            .map_err(|e| ProfileError::Transport(format!("{:?}", e)))
    })
}

/// `RequestSink` backed by the shared socket
#[derive(Clone, Copy, Debug, Default)]
pub struct SocketSink;

impl RequestSink for SocketSink {
    fn send_request(&self, request: &ProfileRequest) -> ProfileResult<()> {
        send_frame(&request.to_frame()?)
    }

    fn close_subscription(&self, sub_id: &str) -> ProfileResult<()> {
        send_frame(&close_frame(sub_id)?)
    }
}
