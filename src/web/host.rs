//! Browser implementation of the table host: DOM access, the outgoing
//! request queue, animation frames and timeouts.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use js_sys::Function;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element};

use crate::host::{
    Dom, FrameHandle, FrameScheduler, FrameToken, LazyRequestId, RequestTicket, ServerChannel,
    TimerHandle, TimerToken,
};
use crate::ids;
use crate::layout::LayoutCommand;
use crate::session::TableRegistry;
use crate::transport::{OutgoingRequest, RequestQueue};

use super::dom::WebDom;

/// Pixels scrolled per line when the wheel reports lines instead of pixels.
const WHEEL_LINE_PX: f64 = 16.0;

/// Vertical wheel movement in pixels. Line deltas are scaled, pixel and
/// page deltas pass through.
pub(crate) fn wheel_delta_px(delta_y: f64, delta_mode: u32) -> f64 {
    if delta_mode == web_sys::WheelEvent::DOM_DELTA_LINE {
        delta_y * WHEEL_LINE_PX
    } else {
        delta_y
    }
}

/// Registry and host behind one borrow.
pub(crate) struct Shared {
    pub(crate) registry: TableRegistry,
    pub(crate) host: WebHost,
}

pub(crate) type SharedRef = Rc<RefCell<Shared>>;

/// A scheduled browser callback together with the closure backing it.
struct Scheduled {
    js_id: i32,
    closure: Closure<dyn FnMut()>,
}

struct Listener {
    element: Element,
    event: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

pub(crate) struct WebHost {
    dom: WebDom,
    queue: RequestQueue,
    shared: Weak<RefCell<Shared>>,
    send: Option<Function>,
    next_handle: u64,
    frames: HashMap<u64, Scheduled>,
    timers: HashMap<u64, Scheduled>,
    /// Closures of callbacks that already ran. The running callback parks
    /// itself here; the next callback drops it.
    spent: Vec<Closure<dyn FnMut()>>,
    listeners: HashMap<String, Vec<Listener>>,
}

/// Requests drained under the borrow, delivered after it is released.
pub(crate) struct Outbox {
    send: Option<Function>,
    requests: Vec<OutgoingRequest>,
}

impl Outbox {
    pub(crate) fn deliver(self) {
        let Some(send) = self.send else {
            if !self.requests.is_empty() {
                tracing::warn!(target: "slicegrid", dropped = self.requests.len(), "no send callback installed");
            }
            return;
        };
        for request in self.requests {
            let command = match serde_wasm_bindgen::to_value(&request.command) {
                Ok(command) => command,
                Err(err) => {
                    web_sys::console::error_1(&JsValue::from_str(&err.to_string()));
                    continue;
                }
            };
            let ticket = request
                .ticket
                .map_or(JsValue::UNDEFINED, |ticket| JsValue::from(ticket.0));
            let lazy_key = request
                .lazy_key
                .map_or(JsValue::UNDEFINED, |key| JsValue::from_str(&key.0));
            if let Err(err) = send.call3(&JsValue::NULL, &command, &ticket, &lazy_key) {
                web_sys::console::error_1(&err);
            }
        }
    }
}

/// Run `f` against the registry and host, then hand queued requests to the page.
///
/// Sending happens after the borrow ends so the page may call back into
/// the controller from its send callback.
pub(crate) fn dispatch<R>(
    shared: &SharedRef,
    f: impl FnOnce(&mut TableRegistry, &mut WebHost) -> R,
) -> R {
    let (result, outbox) = {
        let mut guard = shared.borrow_mut();
        let Shared { registry, host } = &mut *guard;
        let result = f(registry, host);
        (result, host.take_outbox())
    };
    outbox.deliver();
    result
}

fn report(err: crate::SliceGridError) {
    tracing::error!(target: "slicegrid", error = %err, "table event failed");
    web_sys::console::error_1(&JsValue::from_str(&err.to_string()));
}

fn run_frame(shared: &SharedRef, id: u64, token: &FrameToken) {
    dispatch(shared, |registry, host| {
        host.retire(id, true);
        if let Err(err) = registry.on_frame(host, token) {
            report(err);
        }
    });
}

fn run_timer(shared: &SharedRef, id: u64, token: &TimerToken) {
    dispatch(shared, |registry, host| {
        host.retire(id, false);
        registry.on_timer(host, token);
    });
}

impl WebHost {
    pub(crate) fn new(document: Document, shared: Weak<RefCell<Shared>>) -> Self {
        Self {
            dom: WebDom::new(document),
            queue: RequestQueue::new(),
            shared,
            send: None,
            next_handle: 0,
            frames: HashMap::new(),
            timers: HashMap::new(),
            spent: Vec::new(),
            listeners: HashMap::new(),
        }
    }

    pub(crate) fn set_send(&mut self, send: Function) {
        self.send = Some(send);
    }

    pub(crate) fn dom(&self) -> &WebDom {
        &self.dom
    }

    pub(crate) fn complete_lazy(&mut self, key: &LazyRequestId) {
        self.queue.complete_lazy(key);
    }

    pub(crate) fn take_outbox(&mut self) -> Outbox {
        Outbox {
            send: self.send.clone(),
            requests: self.queue.drain(),
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Called from inside a firing callback: drop closures of earlier
    /// callbacks and park the current one.
    fn retire(&mut self, id: u64, frame: bool) {
        self.spent.clear();
        let finished = if frame {
            self.frames.remove(&id)
        } else {
            self.timers.remove(&id)
        };
        if let Some(finished) = finished {
            self.spent.push(finished.closure);
        }
    }

    /// Listen for scrolls on every scrolling element of a table and for the
    /// wheel on its bodies.
    pub(crate) fn attach_listeners(&mut self, table_id: &str, horizontal: bool) {
        if self.listeners.contains_key(table_id) {
            return;
        }
        self.dom.ensure_scrollbars(table_id, horizontal);

        let mut scrolling = vec![
            ids::vertical_scrollbar_id(table_id),
            ids::fix_body_id(table_id),
            ids::flex_body_id(table_id),
        ];
        if horizontal {
            scrolling.push(ids::horizontal_scrollbar_id(table_id));
            scrolling.push(ids::flex_header_id(table_id));
        }

        let mut listeners = Vec::new();
        for element_id in scrolling {
            let Some(element) = self.dom.element(&element_id) else {
                continue;
            };
            let weak = self.shared.clone();
            let table = table_id.to_string();
            let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
                if let Some(shared) = weak.upgrade() {
                    dispatch(&shared, |registry, host| {
                        registry.on_scroll(host, &table, &element_id);
                    });
                }
            }) as Box<dyn FnMut(web_sys::Event)>);
            listeners.extend(listen(element, "scroll", closure));
        }

        for body_id in [ids::fix_body_id(table_id), ids::flex_body_id(table_id)] {
            let Some(element) = self.dom.element(&body_id) else {
                continue;
            };
            let weak = self.shared.clone();
            let table = table_id.to_string();
            let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
                let Some(wheel) = event.dyn_ref::<web_sys::WheelEvent>() else {
                    return;
                };
                let delta = wheel_delta_px(wheel.delta_y(), wheel.delta_mode());
                if let Some(shared) = weak.upgrade() {
                    let taken = dispatch(&shared, |registry, host| {
                        registry.on_wheel(host, &table, delta)
                    });
                    if taken {
                        event.prevent_default();
                    }
                }
            }) as Box<dyn FnMut(web_sys::Event)>);
            listeners.extend(listen(element, "wheel", closure));
        }

        self.listeners.insert(table_id.to_string(), listeners);
    }

    pub(crate) fn detach_listeners(&mut self, table_id: &str) {
        for listener in self.listeners.remove(table_id).unwrap_or_default() {
            let _ = listener.element.remove_event_listener_with_callback(
                listener.event,
                listener.closure.as_ref().unchecked_ref(),
            );
        }
    }

    pub(crate) fn discard_requests(&mut self, table_id: &str) {
        self.queue.discard_control(table_id);
    }
}

fn listen(
    element: Element,
    event: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
) -> Option<Listener> {
    match element.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
        Ok(()) => Some(Listener {
            element,
            event,
            closure,
        }),
        Err(_) => {
            tracing::warn!(target: "slicegrid", event, "could not attach listener");
            None
        }
    }
}

impl Dom for WebHost {
    fn scroll_top(&self, element: &str) -> f64 {
        self.dom.scroll_top(element)
    }

    fn scroll_left(&self, element: &str) -> f64 {
        self.dom.scroll_left(element)
    }

    fn set_scroll_top(&mut self, element: &str, px: f64) {
        self.dom.set_scroll_top(element, px);
    }

    fn set_scroll_left(&mut self, element: &str, px: f64) {
        self.dom.set_scroll_left(element, px);
    }

    fn element_width(&self, element: &str) -> f64 {
        self.dom.element_width(element)
    }

    fn vertical_scrollbar_width(&self) -> f64 {
        self.dom.vertical_scrollbar_width()
    }

    fn rendered_row_height(&self, slice_element: &str) -> Option<f64> {
        self.dom.rendered_row_height(slice_element)
    }

    fn apply(&mut self, command: &LayoutCommand) {
        self.dom.apply(command);
    }

    fn blur_focus_within(&mut self, containers: &[String]) -> bool {
        self.dom.blur_focus_within(containers)
    }
}

impl ServerChannel for WebHost {
    fn execute(&mut self, command: crate::types::ServerCommand, ticket: Option<RequestTicket>) {
        self.queue.execute(command, ticket);
    }

    fn execute_or_update_lazy(&mut self, key: LazyRequestId, command: crate::types::ServerCommand) {
        self.queue.execute_or_update_lazy(key, command);
    }
}

impl FrameScheduler for WebHost {
    fn request_animation_frame(&mut self, token: FrameToken) -> FrameHandle {
        let id = self.next_id();
        let weak = self.shared.clone();
        let closure = Closure::wrap(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                run_frame(&shared, id, &token);
            }
        }) as Box<dyn FnMut()>);
        let scheduled = web_sys::window()
            .ok_or_else(|| JsValue::from_str("no window"))
            .and_then(|window| window.request_animation_frame(closure.as_ref().unchecked_ref()));
        match scheduled {
            Ok(js_id) => {
                self.frames.insert(id, Scheduled { js_id, closure });
            }
            Err(_) => tracing::warn!(target: "slicegrid", "requestAnimationFrame failed"),
        }
        FrameHandle(id)
    }

    fn cancel_animation_frame(&mut self, handle: FrameHandle) {
        if let Some(scheduled) = self.frames.remove(&handle.0) {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(scheduled.js_id);
            }
        }
    }

    fn set_timeout(&mut self, token: TimerToken, delay_ms: u32) -> TimerHandle {
        let id = self.next_id();
        let weak = self.shared.clone();
        let closure = Closure::wrap(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                run_timer(&shared, id, &token);
            }
        }) as Box<dyn FnMut()>);
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        let scheduled = web_sys::window()
            .ok_or_else(|| JsValue::from_str("no window"))
            .and_then(|window| {
                window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    closure.as_ref().unchecked_ref(),
                    delay,
                )
            });
        match scheduled {
            Ok(js_id) => {
                self.timers.insert(id, Scheduled { js_id, closure });
            }
            Err(_) => tracing::warn!(target: "slicegrid", "setTimeout failed"),
        }
        TimerHandle(id)
    }

    fn clear_timeout(&mut self, handle: TimerHandle) {
        if let Some(scheduled) = self.timers.remove(&handle.0) {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(scheduled.js_id);
            }
        }
    }
}
