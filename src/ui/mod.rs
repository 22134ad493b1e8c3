//! Ratatui front-end. `app` owns the screen state and key handling, `forms`
//! the dialog inputs, `helpers` the drawing utilities and `terminal` the
//! crossterm setup and event loop.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
