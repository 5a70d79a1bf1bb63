//! The top-level controller.
//!
//! A [`Session`] owns the single [`Game`], the random source, the input
//! driver and the drawing surface, and plays runs until the driver quits, a
//! run reaches the tick limit, or the restart budget is spent. Each run holds two scoped resources: the
//! [`Ticker`] and the attached driver. Both are released whenever the run
//! ends, however it ends, and acquired again for the next run.

use std::thread;
use std::time::{Duration, Instant};

use color_eyre::Result;
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::action::Command;
use crate::config::{AppConfig, SessionConfig};
use crate::game::{Game, Rules};
use crate::log::{EndReason, Log, RunLog};
use crate::render::Surface;
use crate::runtime::{self, Attached, Driver};

/// Fixed-period tick timer. Cleared when dropped.
pub struct Ticker {
    period: Duration,
    next: Instant,
    realtime: bool,
}

impl Ticker {
    pub fn start(period: Duration, realtime: bool) -> Self {
        debug!("tick timer armed every {period:?}");
        Self {
            period,
            next: Instant::now() + period,
            realtime,
        }
    }

    /// Blocks until the next tick is due. Never blocks when not in realtime.
    pub fn wait(&mut self) {
        if !self.realtime {
            return;
        }
        let now = Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
            self.next += self.period;
        } else {
            // Fell behind; skip the missed ticks instead of bursting.
            self.next = now + self.period;
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        debug!("tick timer cleared");
    }
}

pub struct Session {
    game: Game,
    rng: StdRng,
    driver: Box<dyn Driver>,
    surface: Box<dyn Surface>,
    config: SessionConfig,
    log: RunLog,
}

impl Session {
    pub fn new(
        rules: Rules,
        config: SessionConfig,
        driver: Box<dyn Driver>,
        surface: Box<dyn Surface>,
    ) -> Result<Self> {
        let game = Game::new(rules)?;
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Ok(Self {
            game,
            rng,
            driver,
            surface,
            config,
            log: RunLog::default(),
        })
    }

    pub fn from_config(config: &AppConfig, surface: Box<dyn Surface>) -> Result<Self> {
        config.validate()?;
        let driver = runtime::from_config(&config.driver)?;
        Self::new(
            config.game.clone(),
            config.session.clone(),
            driver,
            surface,
        )
    }

    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// Plays runs until the driver quits, a run hits the tick limit, or no
    /// restarts are left. Only a game over or a restart command starts over.
    pub fn run(mut self) -> Result<RunLog> {
        let mut restarts_left = self.config.restarts;

        loop {
            info!("run {} started", self.log.runs.len() + 1);
            let reason = self.play_run()?;
            let record = self.log.finish(self.game.score(), reason);
            info!(
                "run {} ended ({:?}) with score {}",
                record.run, record.reason, record.score
            );

            let starts_over = matches!(reason, EndReason::Collision | EndReason::Restart);
            if !starts_over || restarts_left == 0 {
                break;
            }
            restarts_left -= 1;
            self.game.restart();
        }

        Ok(self.log)
    }

    fn play_run(&mut self) -> Result<EndReason> {
        let mut ticker = Ticker::start(
            Duration::from_millis(self.game.rules().tick_millis),
            self.config.realtime,
        );
        let mut driver = Attached::new(self.driver.as_mut())?;

        self.surface.draw(&self.game.frame())?;

        loop {
            ticker.wait();

            let command = driver.poll(&self.game)?;
            match command {
                Some(Command::Quit) => return Ok(EndReason::Quit),
                Some(Command::Restart) => return Ok(EndReason::Restart),
                Some(Command::Steer(direction)) => {
                    self.game.steer(direction);
                }
                None => {}
            }

            let Some(tick) = self.game.tick(&mut self.rng) else {
                return Ok(EndReason::Collision);
            };
            trace!("tick {} {:?}", self.game.score(), tick);

            if self.config.record_ticks {
                self.log.record(Log::new(&self.game, command, &tick));
            }
            self.surface.draw(&self.game.frame())?;

            if tick.collided {
                return Ok(EndReason::Collision);
            }
            if self
                .config
                .max_ticks
                .is_some_and(|max| self.game.score() >= max)
            {
                return Ok(EndReason::TickLimit);
            }
        }
    }
}
