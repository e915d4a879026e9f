//! Browser binding tests
//!
//! Run with `wasm-pack test --headless --firefox`. The controller is driven
//! through its exported API against a table rendered into the test page.

#![cfg(target_arch = "wasm32")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]

use std::cell::RefCell;
use std::rc::Rc;

use slicegrid::TableController;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

fn body_part(id: &str) -> String {
    format!(
        r#"<div id="{id}" style="overflow: hidden">
            <div id="{id}_viewport">
                <div id="{id}_viewport_slice-0">
                    <table><tbody>
                        <tr row-height="20"><td>0</td></tr>
                        <tr row-height="20"><td>1</td></tr>
                    </tbody></table>
                </div>
            </div>
        </div>"#
    )
}

/// Render a split table with id `table_id` into the page.
fn render_table(table_id: &str) {
    let markup = format!(
        r#"<div id="{table_id}_table">
            <div id="{table_id}_headerFlex"></div>
            {fix}
            {flex}
        </div>"#,
        fix = body_part(&format!("{table_id}_bodyFix")),
        flex = body_part(&format!("{table_id}_bodyFlex")),
    );
    let host = document().create_element("div").unwrap();
    host.set_inner_html(&markup);
    document().body().unwrap().append_child(&host).unwrap();
}

fn layout_json(table_id: &str) -> String {
    format!(
        r#"{{
            "controlID": "{table_id}",
            "displayVersion": 1,
            "firstPageRow": 0,
            "lastPageRow": 99,
            "firstSliceRow": 0,
            "lastSliceRow": 1,
            "availableWidth": 800,
            "availableHeight": 430,
            "headerHeight": 30,
            "borderWidth": 1,
            "fixColumnWidths": [100],
            "flexColumnWidths": [120, 120, 120]
        }}"#
    )
}

fn shown_table(table_id: &str) -> Rc<TableController> {
    render_table(table_id);
    let controller = Rc::new(TableController::new().unwrap());
    assert_eq!(controller.layout_table_json(&layout_json(table_id)).unwrap(), "created");
    controller.run_layout().unwrap();
    controller
}

fn command_name(command: &JsValue) -> String {
    js_sys::Reflect::get(command, &JsValue::from_str("controlCommand"))
        .unwrap()
        .as_string()
        .unwrap()
}

/// Let pending microtasks, such as mutation observer callbacks, run.
async fn next_microtask() {
    JsFuture::from(js_sys::Promise::resolve(&JsValue::NULL))
        .await
        .unwrap();
}

#[wasm_bindgen_test]
fn send_callback_may_call_back_into_the_controller() {
    let controller = shown_table("web_send");
    let received: Rc<RefCell<Vec<(String, usize)>>> = Rc::default();

    let callback = {
        let controller = Rc::clone(&controller);
        let received = Rc::clone(&received);
        Closure::wrap(Box::new(move |command: JsValue, _ticket: JsValue, _lazy: JsValue| {
            // reentrant: the controller must not be borrowed while sending
            let tables = controller.table_count();
            received.borrow_mut().push((command_name(&command), tables));
        }) as Box<dyn FnMut(JsValue, JsValue, JsValue)>)
    };
    controller.set_send_callback(callback.as_ref().unchecked_ref::<js_sys::Function>().clone());
    callback.forget();

    received.borrow_mut().clear();
    controller
        .update_column_width("web_send", "web_send_bodyFlex_viewport", 1, 150.0, true)
        .unwrap();

    let received = received.borrow();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0], ("updateColumnWidth".to_string(), 1));
}

#[wasm_bindgen_test]
fn out_of_range_column_is_reported_to_the_page() {
    let controller = shown_table("web_column");
    let err = controller
        .update_column_width("web_column", "web_column_bodyFix_viewport", 4, 150.0, false)
        .unwrap_err();
    let message: String = err.dyn_into::<js_sys::Error>().unwrap().message().into();
    assert!(message.contains("column"), "{message}");
}

#[wasm_bindgen_test]
fn missing_scrollbars_are_created() {
    let _controller = shown_table("web_bars");
    assert!(document().get_element_by_id("web_bars_verticalScroll").is_some());
    assert!(document().get_element_by_id("web_bars_horizontalScroll").is_some());
}

#[wasm_bindgen_test]
fn explicit_removal_forgets_the_table() {
    let controller = shown_table("web_remove");
    assert_eq!(controller.table_count(), 1);
    controller.remove_table("web_remove");
    assert_eq!(controller.table_count(), 0);
    assert!(controller.report_state("web_remove").is_none());
}

#[wasm_bindgen_test]
async fn removing_the_table_root_tears_the_table_down() {
    let controller = shown_table("web_detach");
    assert!(controller.report_state("web_detach").is_some());

    document()
        .get_element_by_id("web_detach_table")
        .unwrap()
        .remove();
    next_microtask().await;

    assert_eq!(controller.table_count(), 0);
}
