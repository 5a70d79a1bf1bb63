#![warn(clippy::all, clippy::pedantic, clippy::cargo, clippy::nursery)]
use std::io;

use color_eyre::Result;
use log::info;

use oncoming::config::AppConfig;
use oncoming::render::{NullSurface, Surface, TextSurface};
use oncoming::session::Session;

fn main() -> Result<()> {
    color_eyre::install()?;

    let config = AppConfig::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()),
    )
    .init();

    let surface: Box<dyn Surface> = if config.render.enabled {
        Box::new(
            TextSurface::new(io::stdout(), config.render.columns, config.render.rows)
                .clearing(config.render.clear),
        )
    } else {
        Box::new(NullSurface)
    };

    let log = Session::from_config(&config, surface)?.run()?;

    if let Some(best) = log.best_score() {
        info!("best score: {best}");
    }
    if config.session.print_log {
        log.export(&mut io::stdout().lock())?;
    }

    Ok(())
}
