//! `TableController`, the JavaScript entry point.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{MutationObserver, MutationObserverInit};

use crate::host::{LazyRequestId, RequestTicket};
use crate::ids;
use crate::session::{LayoutOutcome, Part, TableInit, TableRegistry};
use crate::types::ClientDisplayData;

use super::host::{dispatch, Shared, SharedRef, WebHost};

/// All sliced tables of one page.
///
/// The page hands every server payload to the controller and receives
/// outgoing server commands through the callback set with
/// [`set_send_callback`](Self::set_send_callback), called as
/// `send(command, ticket, lazyKey)`. Completion of a ticketed request is
/// reported back with `requestCompleted`, of a lazy one with `lazyCompleted`.
#[wasm_bindgen]
pub struct TableController {
    shared: SharedRef,
    observer: Option<MutationObserver>,
    _observer_closure: Option<Closure<dyn FnMut(js_sys::Array, MutationObserver)>>,
}

fn parse_part(part: &str) -> Result<Part, JsValue> {
    match part {
        "fixed" => Ok(Part::Fixed),
        "flexible" => Ok(Part::Flexible),
        other => Err(JsValue::from_str(&format!("unknown table part '{other}'"))),
    }
}

#[wasm_bindgen]
impl TableController {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<TableController, JsValue> {
        console_error_panic_hook::set_once();

        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let body = document.body();
        let shared: SharedRef = Rc::new_cyclic(|weak| {
            RefCell::new(Shared {
                registry: TableRegistry::new(),
                host: WebHost::new(document, weak.clone()),
            })
        });

        let mut controller = TableController {
            shared,
            observer: None,
            _observer_closure: None,
        };
        if let Some(body) = body {
            controller.observe_removals(&body)?;
        }
        Ok(controller)
    }

    /// Tear a table down once its root element leaves the document.
    fn observe_removals(&mut self, body: &web_sys::HtmlElement) -> Result<(), JsValue> {
        let weak = Rc::downgrade(&self.shared);
        let closure = Closure::wrap(Box::new(move |_records: js_sys::Array, _observer: MutationObserver| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            dispatch(&shared, |registry, host| {
                let gone: Vec<String> = registry
                    .table_ids()
                    .filter(|table_id| !host.dom().exists(&ids::table_root_id(table_id)))
                    .map(str::to_string)
                    .collect();
                for table_id in gone {
                    remove(registry, host, &table_id);
                }
            });
        }) as Box<dyn FnMut(js_sys::Array, MutationObserver)>);

        let observer = MutationObserver::new(closure.as_ref().unchecked_ref())?;
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        observer.observe_with_options(body, &options)?;

        self.observer = Some(observer);
        self._observer_closure = Some(closure);
        Ok(())
    }

    #[wasm_bindgen(js_name = setSendCallback)]
    pub fn set_send_callback(&self, send: js_sys::Function) {
        self.shared.borrow_mut().host.set_send(send);
    }

    /// Lay out a table rendered by the server. Returns `"created"`,
    /// `"resized"` or `"reload"`.
    #[wasm_bindgen(js_name = layoutTable)]
    pub fn layout_table(&self, init: JsValue) -> Result<String, JsValue> {
        let init: TableInit = serde_wasm_bindgen::from_value(init)?;
        self.layout(&init)
    }

    #[wasm_bindgen(js_name = layoutTableJson)]
    pub fn layout_table_json(&self, json: &str) -> Result<String, JsValue> {
        let init = TableInit::from_json(json)?;
        self.layout(&init)
    }

    fn layout(&self, init: &TableInit) -> Result<String, JsValue> {
        let outcome = dispatch(&self.shared, |registry, host| {
            let outcome = registry.layout_table(host, init)?;
            if outcome == LayoutOutcome::Created {
                host.attach_listeners(&init.control_id, init.has_flex_part());
            }
            Ok::<_, crate::SliceGridError>(outcome)
        })?;
        Ok(match outcome {
            LayoutOutcome::Created => "created",
            LayoutOutcome::Resized => "resized",
            LayoutOutcome::ReloadRequested { .. } => "reload",
        }
        .to_string())
    }

    /// Write queued geometry to the document and run pending initial scrolls.
    #[wasm_bindgen(js_name = runLayout)]
    pub fn run_layout(&self) -> Result<(), JsValue> {
        dispatch(&self.shared, |registry, host| registry.run_layout(host))?;
        Ok(())
    }

    #[wasm_bindgen(js_name = insertSlice)]
    pub fn insert_slice(
        &self,
        table_id: &str,
        viewport_id: &str,
        slice_id: &str,
        row_count: u32,
    ) -> Result<(), JsValue> {
        dispatch(&self.shared, |registry, host| {
            registry.insert_slice(host, table_id, viewport_id, slice_id, row_count)
        })?;
        Ok(())
    }

    #[wasm_bindgen(js_name = updatePageRowCount)]
    pub fn update_page_row_count(
        &self,
        table_id: &str,
        viewport_id: &str,
        slice_id: &str,
        row_count: u32,
    ) -> Result<(), JsValue> {
        dispatch(&self.shared, |registry, host| {
            registry.update_page_row_count(host, table_id, viewport_id, slice_id, row_count)
        })?;
        Ok(())
    }

    #[wasm_bindgen(js_name = updateColumnWidth)]
    pub fn update_column_width(
        &self,
        table_id: &str,
        viewport_id: &str,
        column: usize,
        width: f64,
        update_server: bool,
    ) -> Result<(), JsValue> {
        dispatch(&self.shared, |registry, host| {
            registry.update_column_width(host, table_id, viewport_id, column, width, update_server)
        })?;
        Ok(())
    }

    /// Move a column in front of `insert_before`. `part` is `"fixed"` or
    /// `"flexible"`. Returns the new fixed column count.
    #[wasm_bindgen(js_name = reorderColumns)]
    pub fn reorder_columns(
        &self,
        table_id: &str,
        from: usize,
        insert_before: usize,
        part: &str,
    ) -> Result<usize, JsValue> {
        let part = parse_part(part)?;
        let reorder = dispatch(&self.shared, |registry, host| {
            registry.reorder_columns(host, table_id, from, insert_before, part)
        })?;
        Ok(reorder.fixed_count)
    }

    #[wasm_bindgen(js_name = scrollToRequestedPosition)]
    pub fn scroll_to_requested_position(&self, table_id: &str, data: JsValue) -> Result<(), JsValue> {
        let data: Option<ClientDisplayData> = if data.is_undefined() || data.is_null() {
            None
        } else {
            Some(serde_wasm_bindgen::from_value(data)?)
        };
        dispatch(&self.shared, |registry, host| {
            registry.scroll_to_requested_position(host, table_id, data);
        });
        Ok(())
    }

    #[wasm_bindgen(js_name = requestCompleted)]
    pub fn request_completed(&self, table_id: &str, ticket: u64) {
        dispatch(&self.shared, |registry, host| {
            registry.request_completed(host, table_id, RequestTicket(ticket));
        });
    }

    #[wasm_bindgen(js_name = lazyCompleted)]
    pub fn lazy_completed(&self, key: String) {
        dispatch(&self.shared, |_, host| {
            host.complete_lazy(&LazyRequestId(key));
        });
    }

    #[wasm_bindgen(js_name = removeTable)]
    pub fn remove_table(&self, table_id: &str) {
        dispatch(&self.shared, |registry, host| remove(registry, host, table_id));
    }

    /// Multi-line dump of a table's slices, `undefined` for unknown tables.
    #[wasm_bindgen(js_name = reportState)]
    pub fn report_state(&self, table_id: &str) -> Option<String> {
        self.shared
            .borrow()
            .registry
            .get(table_id)
            .map(|session| session.manager().report_state("requested by page"))
    }

    #[wasm_bindgen(js_name = tableCount)]
    pub fn table_count(&self) -> usize {
        self.shared.borrow().registry.len()
    }
}

fn remove(registry: &mut TableRegistry, host: &mut WebHost, table_id: &str) {
    registry.remove_table(host, table_id);
    host.detach_listeners(table_id);
    host.discard_requests(table_id);
}

impl Drop for TableController {
    fn drop(&mut self) {
        if let Some(observer) = &self.observer {
            observer.disconnect();
        }
    }
}
