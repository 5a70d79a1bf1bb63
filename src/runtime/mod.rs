//! Input sources.
//!
//! A [`Driver`] stands in for the keyboard: once per tick the session asks it
//! for at most one [`Command`].

use std::ops::{Deref, DerefMut};

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::debug;

use crate::action::Command;
use crate::config::{DriverConfig, DriverKind};
use crate::game::Game;

pub mod lua;
pub mod scripted;

pub use lua::LuaDriver;
pub use scripted::ScriptedDriver;

pub trait Driver {
    /// Called when a run starts listening for input.
    fn attach(&mut self) -> Result<()> {
        Ok(())
    }

    fn poll(&mut self, game: &Game) -> Result<Option<Command>>;

    /// Called when the run stops listening, on every exit path.
    fn detach(&mut self) {}
}

/// A driver that is currently attached to a run. Detaches on drop.
pub struct Attached<'a> {
    driver: &'a mut dyn Driver,
}

impl<'a> Attached<'a> {
    pub fn new(driver: &'a mut dyn Driver) -> Result<Self> {
        driver.attach()?;
        debug!("input listener attached");
        Ok(Self { driver })
    }
}

impl<'a> Deref for Attached<'a> {
    type Target = dyn Driver + 'a;

    fn deref(&self) -> &Self::Target {
        self.driver
    }
}

impl<'a> DerefMut for Attached<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.driver
    }
}

impl Drop for Attached<'_> {
    fn drop(&mut self) {
        self.driver.detach();
        debug!("input listener detached");
    }
}

pub fn from_config(config: &DriverConfig) -> Result<Box<dyn Driver>> {
    match config.kind {
        DriverKind::Lua => {
            let Some(path) = config.script.as_deref() else {
                color_eyre::eyre::bail!("lua driver configured without a script");
            };
            let driver = LuaDriver::from_file(path)
                .wrap_err_with(|| format!("loading driver script {}", path.display()))?;
            Ok(Box::new(driver))
        }
        DriverKind::Scripted => Ok(Box::new(ScriptedDriver::parse(&config.commands)?)),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::game::Rules;

    struct Counting {
        attached: Rc<Cell<usize>>,
        detached: Rc<Cell<usize>>,
    }

    impl Driver for Counting {
        fn attach(&mut self) -> Result<()> {
            self.attached.set(self.attached.get() + 1);
            Ok(())
        }

        fn poll(&mut self, _game: &Game) -> Result<Option<Command>> {
            color_eyre::eyre::bail!("input device unplugged")
        }

        fn detach(&mut self) {
            self.detached.set(self.detached.get() + 1);
        }
    }

    #[test]
    fn attached_driver_detaches_on_error_paths() {
        let attached = Rc::new(Cell::new(0));
        let detached = Rc::new(Cell::new(0));
        let mut driver = Counting {
            attached: attached.clone(),
            detached: detached.clone(),
        };
        let game = Game::new(Rules::default()).unwrap();

        let result = (|| -> Result<Option<Command>> {
            let mut listener = Attached::new(&mut driver)?;
            listener.poll(&game)
        })();

        assert!(result.is_err());
        assert_eq!(attached.get(), 1);
        assert_eq!(detached.get(), 1);
    }

    #[test]
    fn builds_scripted_driver_from_config() {
        let config = DriverConfig {
            kind: DriverKind::Scripted,
            script: None,
            commands: vec!["up".into(), "left".into()],
        };
        let mut driver = from_config(&config).unwrap();
        let game = Game::new(Rules::default()).unwrap();
        assert_eq!(
            driver.poll(&game).unwrap(),
            Some(Command::Steer(crate::action::Direction::Up))
        );
    }

    #[test]
    fn lua_driver_needs_a_readable_script() {
        let config = DriverConfig {
            kind: DriverKind::Lua,
            script: Some("does/not/exist.lua".into()),
            commands: Vec::new(),
        };
        assert!(from_config(&config).is_err());
    }
}
