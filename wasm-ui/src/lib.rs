//! Web UI for imboard-panel
//!
//! Yew-based admin panel and image widgets for the imageboard indexer.
//! The admin page carries a `panel-main` element, the image page an
//! `image-info-main` element; the entry point mounts whichever widget the
//! current page hosts.

mod app;
mod components;
mod image_info;
mod socket;

use wasm_bindgen::prelude::*;

/// Entry point for the WASM application.
#[wasm_bindgen(start)]
pub fn run_app() {
    // Initialize panic hook for better error messages
    console_error_panic_hook::set_once();

    let document = gloo::utils::document();
    if let Some(root) = document.get_element_by_id("panel-main") {
        yew::Renderer::<app::AdminPanel>::with_root(root).render();
    } else if let Some(root) = document.get_element_by_id("image-info-main") {
        yew::Renderer::<image_info::ImageInfo>::with_root(root).render();
    } else {
        yew::Renderer::<app::AdminPanel>::new().render();
    }
}
