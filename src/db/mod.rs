//! Key/value persistence split across logical submodules. The rest of the
//! crate only sees named string sets; the SQLite schema behind them stays an
//! implementation detail of this module.

mod connection;
mod string_sets;

pub use connection::{open_in_memory_store, open_store};
pub use string_sets::{get_string_set, put_string_set};
