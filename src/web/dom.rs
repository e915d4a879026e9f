//! [`Dom`] on top of the browser document.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::host::Dom;
use crate::ids;
use crate::layout::LayoutCommand;

/// Attribute the server renders on every row with its height in pixels.
const ROW_HEIGHT_ATTRIBUTE: &str = "row-height";

pub(crate) struct WebDom {
    document: Document,
}

fn px(value: f64) -> String {
    format!("{value}px")
}

#[allow(clippy::cast_possible_truncation)] // scroll offsets are far inside the i32 range
fn to_scroll_offset(value: f64) -> i32 {
    value.round() as i32
}

impl WebDom {
    pub(crate) fn new(document: Document) -> Self {
        Self { document }
    }

    pub(crate) fn element(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn html_element(&self, id: &str) -> Option<HtmlElement> {
        self.element(id)?.dyn_into::<HtmlElement>().ok()
    }

    pub(crate) fn exists(&self, id: &str) -> bool {
        self.element(id).is_some()
    }

    fn set_style(&self, id: &str, property: &str, value: &str) {
        if let Some(element) = self.html_element(id) {
            if element.style().set_property(property, value).is_err() {
                tracing::warn!(target: "slicegrid", element = id, property, "style write rejected");
            }
        }
    }

    /// Create the decoupled scrollbars of a table inside its root element
    /// unless the server already rendered them.
    pub(crate) fn ensure_scrollbars(&self, table_id: &str, horizontal: bool) {
        let Some(root) = self.element(&ids::table_root_id(table_id)) else {
            return;
        };
        self.ensure_scrollbar(
            &root,
            &ids::vertical_scrollbar_id(table_id),
            &ids::vertical_scrollbar_inner_id(table_id),
            ("overflow-y", "overflow-x"),
        );
        if horizontal {
            self.ensure_scrollbar(
                &root,
                &ids::horizontal_scrollbar_id(table_id),
                &ids::horizontal_scrollbar_inner_id(table_id),
                ("overflow-x", "overflow-y"),
            );
        }
    }

    fn ensure_scrollbar(&self, root: &Element, outer_id: &str, inner_id: &str, overflow: (&str, &str)) {
        if self.exists(outer_id) {
            return;
        }
        let created = (|| -> Result<(), wasm_bindgen::JsValue> {
            let outer = self.document.create_element("div")?.dyn_into::<HtmlElement>()?;
            outer.set_id(outer_id);
            let style = outer.style();
            style.set_property("position", "absolute")?;
            style.set_property(overflow.0, "scroll")?;
            style.set_property(overflow.1, "hidden")?;
            let inner = self.document.create_element("div")?.dyn_into::<HtmlElement>()?;
            inner.set_id(inner_id);
            inner.style().set_property("visibility", "hidden")?;
            inner.style().set_property("min-height", "1px")?;
            outer.append_child(&inner)?;
            root.append_child(&outer)?;
            Ok(())
        })();
        if created.is_err() {
            tracing::warn!(target: "slicegrid", element = outer_id, "could not create scrollbar");
        }
    }
}

impl Dom for WebDom {
    fn scroll_top(&self, element: &str) -> f64 {
        self.element(element)
            .map_or(0.0, |e| f64::from(e.scroll_top()))
    }

    fn scroll_left(&self, element: &str) -> f64 {
        self.element(element)
            .map_or(0.0, |e| f64::from(e.scroll_left()))
    }

    fn set_scroll_top(&mut self, element: &str, px: f64) {
        if let Some(e) = self.element(element) {
            e.set_scroll_top(to_scroll_offset(px));
        }
    }

    fn set_scroll_left(&mut self, element: &str, px: f64) {
        if let Some(e) = self.element(element) {
            e.set_scroll_left(to_scroll_offset(px));
        }
    }

    fn element_width(&self, element: &str) -> f64 {
        self.html_element(element)
            .map_or(0.0, |e| f64::from(e.offset_width()))
    }

    fn vertical_scrollbar_width(&self) -> f64 {
        let inner = web_sys::window()
            .and_then(|window| window.inner_width().ok())
            .and_then(|width| width.as_f64())
            .unwrap_or(0.0);
        let client = self
            .document
            .document_element()
            .map_or(inner, |root| f64::from(root.client_width()));
        (inner - client).max(0.0)
    }

    fn rendered_row_height(&self, slice_element: &str) -> Option<f64> {
        let slice = self.element(slice_element)?;
        let row = slice.query_selector("tbody > tr:last-child").ok()??;
        row.get_attribute(ROW_HEIGHT_ATTRIBUTE)?.trim().parse().ok()
    }

    fn apply(&mut self, command: &LayoutCommand) {
        match command {
            LayoutCommand::SetPosition { target, x, y } => {
                self.set_style(target, "left", &px(*x));
                self.set_style(target, "top", &px(*y));
            }
            LayoutCommand::SetWidth { target, width } => {
                self.set_style(target, "width", &px(*width));
            }
            LayoutCommand::SetHeight { target, height } => {
                self.set_style(target, "height", &px(*height));
            }
            LayoutCommand::SetColumnWidth {
                slice,
                column,
                width,
            } => {
                let Some(element) = self.element(slice) else {
                    return;
                };
                let selector = format!("colgroup > col:nth-child({})", column + 1);
                if let Ok(Some(col)) = element.query_selector(&selector) {
                    if let Ok(col) = col.dyn_into::<HtmlElement>() {
                        let _ = col.style().set_property("width", &px(*width));
                    }
                }
            }
            LayoutCommand::SetScrollLeft { target, px } => self.set_scroll_left(target, *px),
            LayoutCommand::SetScrollTop { target, px } => self.set_scroll_top(target, *px),
            LayoutCommand::Remove { target } => {
                if let Some(element) = self.element(target) {
                    element.remove();
                }
            }
        }
    }

    fn blur_focus_within(&mut self, containers: &[String]) -> bool {
        let Some(active) = self.document.active_element() else {
            return false;
        };
        let inside = containers.iter().any(|id| {
            self.element(id)
                .is_some_and(|container| container.contains(Some(&*active)))
        });
        if !inside {
            return false;
        }
        active
            .dyn_into::<HtmlElement>()
            .is_ok_and(|active| active.blur().is_ok())
    }
}
