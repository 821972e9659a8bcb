mod app;
mod board_core;
mod config;
mod gesture;
mod pointer;
mod storage;

use app::*;
use leptos::prelude::*;

fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(|| {
        view! {
            <App/>
        }
    })
}
