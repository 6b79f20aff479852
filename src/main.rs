use anyhow::Result;
use chinook::uci::UciHandler;

fn main() -> Result<()> {
    env_logger::init();
    log::info!("chinook {} ready", env!("CARGO_PKG_VERSION"));

    UciHandler::new().run()
}
