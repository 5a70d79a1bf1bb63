use std::fmt;
use std::str::FromStr;

use color_eyre::eyre::{eyre, Report};
use serde::{Deserialize, Serialize};

use crate::car::Car;
use crate::game::Rules;

/// One of the four steering commands a player can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Maps a host key name (`ArrowUp`, ...) to a direction.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(Self::Up),
            "ArrowDown" => Some(Self::Down),
            "ArrowLeft" => Some(Self::Left),
            "ArrowRight" => Some(Self::Right),
            _ => None,
        }
    }

    /// Applies this command to `car` and returns the moved car.
    ///
    /// Up/down change speed, left/right change lane. Whatever the command,
    /// the current speed is then fed into the vertical position.
    #[must_use]
    pub fn apply(self, car: &Car, rules: &Rules) -> Car {
        let mut speed = car.speed;
        let mut x = car.x;

        match self {
            Self::Up => speed = (speed + rules.speed_step).min(rules.max_speed),
            Self::Down => speed = (speed - rules.speed_step).max(0.0),
            Self::Left => x = (x - rules.lateral_step).max(0.0),
            Self::Right => x = (x + rules.lateral_step).min(rules.max_x),
        }

        let y = (car.y - speed).min(rules.max_y).max(0.0);

        Car::new(x, y, speed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(direction) = Self::from_key(s) {
            return Ok(direction);
        }
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| eyre!("unknown direction {s:?}"))
    }
}

/// What an input source can ask of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Steer(Direction),
    Restart,
    Quit,
}

impl FromStr for Command {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "restart" => Ok(Self::Restart),
            "quit" => Ok(Self::Quit),
            _ => s.parse().map(Self::Steer),
        }
    }
}
