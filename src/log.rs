use std::io::Write;

use color_eyre::Result;
use serde::{Deserialize, Serialize};

use crate::action::Command;
use crate::car::Car;
use crate::game::{Game, Tick};

/// One tick of a run, as seen after the world stepped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    pub score: u64,
    pub command: Option<Command>,
    pub player: Car,
    pub obstacles: usize,
    pub spawned: bool,
    pub culled: usize,
    pub collided: bool,
}

impl Log {
    pub fn new(game: &Game, command: Option<Command>, tick: &Tick) -> Self {
        Self {
            score: game.score(),
            command,
            player: *game.player(),
            obstacles: game.obstacles().len(),
            spawned: tick.spawned.is_some(),
            culled: tick.culled,
            collided: tick.collided,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Collision,
    TickLimit,
    Restart,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run: usize,
    pub score: u64,
    pub reason: EndReason,
    pub ticks: Vec<Log>,
}

/// Every run a session played, in order.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    pub runs: Vec<RunRecord>,
    #[serde(skip)]
    current: Vec<Log>,
}

impl RunLog {
    pub fn record(&mut self, log: Log) {
        self.current.push(log);
    }

    /// Closes the run in progress and returns its record.
    pub fn finish(&mut self, score: u64, reason: EndReason) -> &RunRecord {
        let record = RunRecord {
            run: self.runs.len() + 1,
            score,
            reason,
            ticks: std::mem::take(&mut self.current),
        };
        self.runs.push(record);
        &self.runs[self.runs.len() - 1]
    }

    pub fn best_score(&self) -> Option<u64> {
        self.runs.iter().map(|run| run.score).max()
    }

    pub fn export<W: Write>(&self, out: &mut W) -> Result<()> {
        let json = serde_json::json!({"runs": self.runs, "best": self.best_score()});
        writeln!(out, "{json}")?;
        Ok(())
    }
}
