//! Platform glue
//!
//! - Logger setup (browser console on the web, env_logger natively)
//! - `web::WebStage`: the JavaScript-facing wrapper around a stage (wasm only)

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Install the logger for this platform (idempotent)
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Install the logger for this platform (idempotent)
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}
