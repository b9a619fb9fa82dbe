pub mod protocol;
pub mod rest;
pub mod speed_test;
pub mod state;
pub mod usage_task;
pub mod ws_handler;

// Re-export the main handlers to make them easily accessible
// to the binary that will build the web server router.
pub use rest::session_snapshot_handler;
pub use ws_handler::ws_handler;
