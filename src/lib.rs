//! Core library surface for the Santa Reporter TUI.
//!
//! The binary wires these pieces together explicitly: configuration and
//! logging first, then the storage adapter, which is moved into the state
//! controller, which in turn is driven by the terminal front-end.
pub mod config;
pub mod controller;
pub mod db;
pub mod logging;
pub mod models;
pub mod storage;
pub mod ui;

pub use config::Config;
pub use controller::{SnackbarMessage, StateController, UiMode};
pub use logging::init_logging;
pub use models::{Child, RecordError};
pub use storage::{MemoryStorage, SqliteStorage, Storage, StorageError};

/// The interactive application entry point and screen state.
pub use ui::{run_app, App};
