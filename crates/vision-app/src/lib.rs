//! Vision App: WASM entry point.
//!
//! This crate is the composition root (DI wiring layer).
//! It assembles the browser adapters, hands them to the session controller,
//! and exports the result to the page as `RealtimeConsole`.

mod console;

pub use console::RealtimeConsole;

use wasm_bindgen::prelude::*;

/// WASM entry point, runs once when the module is instantiated
#[wasm_bindgen(start)]
pub fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Realtime vision console loaded");
}
