use std::fs;
use std::path::Path;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, warn};
use mlua::{Function, Lua, UserData};

use crate::action::Command;
use crate::car::Car;
use crate::game::Game;
use crate::runtime::Driver;

const TURN_FUNCTION: &str = "takeYourTurn";
const START_HOOK: &str = "onStart";
const STATE_GLOBAL: &str = "GameState";

/// Drives the player from a Lua script.
///
/// The script must define a global `takeYourTurn()` returning a command name
/// (`"up"`, `"left"`, `"restart"`, ...) or `nil`. Before every call the
/// current game is published read-only as the global `GameState`, with
/// `player`, `obstacles`, `score`, `tick`, `over` and `max_x` fields. An optional
/// `onStart()` runs whenever a new run begins.
pub struct LuaDriver {
    lua: Lua,
    name: String,
}

impl LuaDriver {
    pub fn new(script: &str, name: &str) -> Result<Self> {
        let lua = Lua::new();
        lua.load(script)
            .set_name(name)
            .exec()
            .wrap_err_with(|| format!("failed to load {name}"))?;

        let _: Function = lua
            .globals()
            .get(TURN_FUNCTION)
            .wrap_err_with(|| format!("{name} does not define {TURN_FUNCTION}()"))?;

        Ok(Self {
            lua,
            name: name.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let script = fs::read_to_string(path)?;
        Self::new(&script, &path.display().to_string())
    }
}

impl Driver for LuaDriver {
    fn attach(&mut self) -> Result<()> {
        let hook: Option<Function> = self.lua.globals().get(START_HOOK)?;
        if let Some(hook) = hook {
            hook.call::<_, ()>(())
                .wrap_err_with(|| format!("{}: {START_HOOK}() failed", self.name))?;
        }
        Ok(())
    }

    fn poll(&mut self, game: &Game) -> Result<Option<Command>> {
        let globals = self.lua.globals();
        globals.set(STATE_GLOBAL, GameView::from(game))?;

        let take_your_turn: Function = globals.get(TURN_FUNCTION)?;
        let reply = match take_your_turn.call::<_, Option<String>>(()) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("{}: {TURN_FUNCTION}() failed: {e}", self.name);
                return Ok(None);
            }
        };

        let Some(reply) = reply else {
            return Ok(None);
        };
        match reply.parse() {
            Ok(command) => {
                debug!("{} -> {reply}", self.name);
                Ok(Some(command))
            }
            Err(e) => {
                warn!("{}: ignoring reply: {e}", self.name);
                Ok(None)
            }
        }
    }

    fn detach(&mut self) {
        if let Err(e) = self.lua.globals().set(STATE_GLOBAL, mlua::Value::Nil) {
            warn!("{}: could not clear {STATE_GLOBAL}: {e}", self.name);
        }
    }
}

/// Read-only snapshot of a game handed to the script.
struct GameView {
    player: Car,
    obstacles: Vec<Car>,
    nearest: Option<Car>,
    score: u64,
    tick: u64,
    over: bool,
    max_x: f64,
}

impl From<&Game> for GameView {
    fn from(game: &Game) -> Self {
        Self {
            player: *game.player(),
            obstacles: game.obstacles().to_vec(),
            nearest: game.nearest_obstacle(),
            score: game.score(),
            tick: game.ticks(),
            over: game.is_over(),
            max_x: game.rules().max_x,
        }
    }
}

impl UserData for GameView {
    fn add_fields<'lua, F: mlua::prelude::LuaUserDataFields<'lua, Self>>(fields: &mut F) {
        fields.add_field_method_get("player", |_, this| Ok(this.player));
        fields.add_field_method_get("obstacles", |_, this| Ok(this.obstacles.clone()));
        fields.add_field_method_get("score", |_, this| Ok(this.score));
        fields.add_field_method_get("tick", |_, this| Ok(this.tick));
        fields.add_field_method_get("over", |_, this| Ok(this.over));
        fields.add_field_method_get("max_x", |_, this| Ok(this.max_x));
    }

    fn add_methods<'lua, M: mlua::UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_method("nearest_obstacle", |_, this, (): ()| Ok(this.nearest));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Direction;
    use crate::game::Rules;

    const LANE_HOPPER: &str = r#"
        turns = 0
        function onStart()
            turns = 0
        end
        function takeYourTurn()
            turns = turns + 1
            if GameState.score >= 2 then
                return "quit"
            end
            if GameState.player.x > GameState.max_x / 2 then
                return "left"
            end
            return "right"
        end
    "#;

    #[test]
    fn script_sees_the_game_and_steers() {
        let mut driver = LuaDriver::new(LANE_HOPPER, "hopper").unwrap();
        driver.attach().unwrap();

        let mut game = Game::new(Rules::default()).unwrap();
        assert_eq!(
            driver.poll(&game).unwrap(),
            Some(Command::Steer(Direction::Left))
        );

        game.steer(Direction::Left);
        game.steer(Direction::Left);
        game.steer(Direction::Left);
        assert_eq!(
            driver.poll(&game).unwrap(),
            Some(Command::Steer(Direction::Right))
        );
    }

    #[test]
    fn reads_score_from_the_snapshot() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let rules = Rules {
            spawn_chance: 0.0,
            ..Rules::default()
        };
        let mut game = Game::new(rules).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        game.tick(&mut rng);
        game.tick(&mut rng);

        let mut driver = LuaDriver::new(LANE_HOPPER, "hopper").unwrap();
        assert_eq!(driver.poll(&game).unwrap(), Some(Command::Quit));
    }

    #[test]
    fn tick_counter_is_published() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let script = r#"
            function takeYourTurn()
                if GameState.tick == nil then return "quit" end
                if GameState.tick >= 3 then return "right" end
                return "left"
            end
        "#;
        let mut driver = LuaDriver::new(script, "ticks").unwrap();
        let rules = Rules {
            spawn_chance: 0.0,
            ..Rules::default()
        };
        let mut game = Game::new(rules).unwrap();
        assert_eq!(
            driver.poll(&game).unwrap(),
            Some(Command::Steer(Direction::Left))
        );

        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..3 {
            game.tick(&mut rng);
        }
        assert_eq!(
            driver.poll(&game).unwrap(),
            Some(Command::Steer(Direction::Right))
        );

        game.restart();
        assert_eq!(
            driver.poll(&game).unwrap(),
            Some(Command::Steer(Direction::Left))
        );
    }

    #[test]
    fn nearest_obstacle_is_a_table_or_nil() {
        let script = r#"
            function takeYourTurn()
                local car = GameState:nearest_obstacle()
                if car == nil then return nil end
                if car.x < GameState.player.x then return "right" end
                return "left"
            end
        "#;
        let mut driver = LuaDriver::new(script, "nearest").unwrap();

        let empty = Game::new(Rules::default()).unwrap();
        assert_eq!(driver.poll(&empty).unwrap(), None);

        let game = Game::from_parts(
            Rules::default(),
            Car::player(),
            vec![Car::obstacle(40.0, 50.0, 2.0)],
        )
        .unwrap();
        assert_eq!(
            driver.poll(&game).unwrap(),
            Some(Command::Steer(Direction::Right))
        );
    }

    #[test]
    fn runtime_errors_and_bad_replies_are_skipped() {
        let game = Game::new(Rules::default()).unwrap();

        let mut failing =
            LuaDriver::new("function takeYourTurn() error('boom') end", "failing").unwrap();
        assert_eq!(failing.poll(&game).unwrap(), None);

        let mut confused =
            LuaDriver::new("function takeYourTurn() return 'fly' end", "confused").unwrap();
        assert_eq!(confused.poll(&game).unwrap(), None);
    }

    #[test]
    fn script_without_turn_function_is_rejected() {
        assert!(LuaDriver::new("x = 1", "empty").is_err());
        assert!(LuaDriver::new("this is not lua", "broken").is_err());
    }

    #[test]
    fn detach_clears_the_published_state() {
        let script = r#"
            function takeYourTurn()
                if GameState == nil then return "quit" end
                return nil
            end
        "#;
        let mut driver = LuaDriver::new(script, "detach").unwrap();
        let game = Game::new(Rules::default()).unwrap();
        assert_eq!(driver.poll(&game).unwrap(), None);
        driver.detach();
        let seen: Option<mlua::Value> = driver.lua.globals().get(STATE_GLOBAL).ok();
        assert!(matches!(seen, Some(mlua::Value::Nil)));
    }
}
