use mlua::prelude::LuaError;
use mlua::{IntoLua, Lua, Value};
use serde::{Deserialize, Serialize};

pub const PLAYER_START_X: f64 = 50.0;
pub const PLAYER_START_Y: f64 = 80.0;

/// A car on the road. Coordinates are percentages of the play area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub x: f64,
    pub y: f64,
    pub speed: f64,
}

impl Car {
    pub const fn new(x: f64, y: f64, speed: f64) -> Self {
        Self { x, y, speed }
    }

    /// The player's car, centered and parked at the bottom.
    pub const fn player() -> Self {
        Self::new(PLAYER_START_X, PLAYER_START_Y, 0.0)
    }

    /// An oncoming car entering the road at `y`.
    pub const fn obstacle(x: f64, y: f64, speed: f64) -> Self {
        Self::new(x, y, speed)
    }
}

impl<'lua> IntoLua<'lua> for Car {
    fn into_lua(self, lua: &'lua Lua) -> color_eyre::Result<Value<'lua>, LuaError> {
        let table = lua.create_table()?;
        table.set("x", self.x)?;
        table.set("y", self.y)?;
        table.set("speed", self.speed)?;
        Ok(Value::Table(table))
    }
}
