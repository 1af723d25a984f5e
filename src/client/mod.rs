//! Client side of the analyzer.
//!
//! - `http` talks to the analysis endpoint and keeps the last raw reply
//! - `app` holds the screen state and key bindings
//! - `tui` draws the screen and runs the event loop

pub mod app;
pub mod http;
pub mod tui;

pub use http::AnalysisClient;
pub use tui::run_tui;
