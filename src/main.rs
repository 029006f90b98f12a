#![allow(non_snake_case)]

use dioxus::prelude::*;

// Modules
mod components;
mod context;
mod stores;
mod utils;

use components::ProfilePage;
use context::ProfileProvider;

fn main() {
    // Initialize panic hook for better error messages in browser console
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
    }

    log::info!("Starting nostrprofile");

    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        ProfileProvider {
            ProfilePage {}
        }
    }
}
