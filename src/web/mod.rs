//! WebAssembly binding: the browser host and the exported controller.

mod controller;
mod dom;
mod host;

pub use controller::TableController;
