mod alloc;
mod config;
mod db;
mod error;
mod import;
mod logging;
mod models;
mod report;
mod run;
mod ui;

use anyhow::Result;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = config::Config::load()?;
    logging::init(&config)?;
    let mut db = db::Database::open(&config.db_path)?;

    let result = match args.len() {
        1 => run::as_tui(&mut db),
        2.. => run::as_cli(&args, &mut db),
        _ => {
            eprintln!("Usage: costshare [command]");
            Ok(())
        }
    };
    if let Err(ref e) = result {
        tracing::error!(error = %e, "costshare exited with error");
    }
    result
}
