//! Binary entry point: resolve settings, start file logging, open the
//! string-set store, load the list into the controller and hand it to the TUI
//! until the user quits.
use anyhow::Context;
use santa_reporter::{init_logging, run_app, App, Config, SqliteStorage, StateController};

fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_logging(&config)?;

    let db_path = config.db_path()?;
    tracing::info!(path = %db_path.display(), "starting santa-reporter");
    let storage = SqliteStorage::open(&db_path).context("failed to open the children store")?;
    let controller = StateController::new(storage).context("failed to load children")?;

    let mut app = App::new(controller, &config);
    run_app(&mut app)
}
