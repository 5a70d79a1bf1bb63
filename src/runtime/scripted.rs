use color_eyre::eyre::WrapErr;
use color_eyre::Result;

use crate::action::Command;
use crate::game::Game;
use crate::runtime::Driver;

/// Replays a fixed list of commands, one per tick, then goes quiet.
///
/// An empty entry or `idle` means "no key pressed" for that tick. The
/// replay starts over every time the driver is attached to a new run.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDriver {
    commands: Vec<Option<Command>>,
    cursor: usize,
}

impl ScriptedDriver {
    pub const fn new(commands: Vec<Option<Command>>) -> Self {
        Self {
            commands,
            cursor: 0,
        }
    }

    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let commands = lines
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let line = line.as_ref().trim();
                if line.is_empty() || line.eq_ignore_ascii_case("idle") {
                    return Ok(None);
                }
                line.parse::<Command>()
                    .map(Some)
                    .wrap_err_with(|| format!("scripted command #{}", index + 1))
            })
            .collect::<Result<_>>()?;
        Ok(Self::new(commands))
    }
}

impl Driver for ScriptedDriver {
    fn attach(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn poll(&mut self, _game: &Game) -> Result<Option<Command>> {
        let command = self.commands.get(self.cursor).copied().flatten();
        self.cursor = self.cursor.saturating_add(1);
        Ok(command)
    }
}
