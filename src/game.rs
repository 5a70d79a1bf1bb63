use color_eyre::eyre::{ensure, Result};
use log::{debug, trace};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::action::Direction;
use crate::car::Car;
use crate::render::Frame;

const TICK_MILLIS: u64 = 50;
const SPEED_STEP: f64 = 0.5;
const MAX_SPEED: f64 = 5.0;
const LATERAL_STEP: f64 = 2.0;
const MAX_X: f64 = 90.0;
const MAX_Y: f64 = 80.0;
const DESPAWN_Y: f64 = 100.0;
const SPAWN_Y: f64 = -10.0;
const SPAWN_CHANCE: f64 = 0.05;
const SPAWN_SPEED_MIN: f64 = 1.0;
const SPAWN_SPEED_MAX: f64 = 3.0;
const COLLISION_DISTANCE: f64 = 10.0;

/// Which obstacle list the collision check looks at.
///
/// `PreStep` checks the obstacles as they were before this tick moved,
/// culled and spawned them, so a hit registers one tick late.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionSnapshot {
    #[default]
    PreStep,
    PostStep,
}

/// Tunables for movement, spawning and collision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub tick_millis: u64,
    pub speed_step: f64,
    pub max_speed: f64,
    pub lateral_step: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub despawn_y: f64,
    pub spawn_y: f64,
    pub spawn_chance: f64,
    pub spawn_speed_min: f64,
    pub spawn_speed_max: f64,
    pub collision_distance: f64,
    pub collision_snapshot: CollisionSnapshot,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            tick_millis: TICK_MILLIS,
            speed_step: SPEED_STEP,
            max_speed: MAX_SPEED,
            lateral_step: LATERAL_STEP,
            max_x: MAX_X,
            max_y: MAX_Y,
            despawn_y: DESPAWN_Y,
            spawn_y: SPAWN_Y,
            spawn_chance: SPAWN_CHANCE,
            spawn_speed_min: SPAWN_SPEED_MIN,
            spawn_speed_max: SPAWN_SPEED_MAX,
            collision_distance: COLLISION_DISTANCE,
            collision_snapshot: CollisionSnapshot::default(),
        }
    }
}

impl Rules {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.tick_millis > 0, "tick_millis must be positive");
        ensure!(
            (0.0..=1.0).contains(&self.spawn_chance),
            "spawn_chance must be within [0, 1], got {}",
            self.spawn_chance
        );
        ensure!(
            self.spawn_speed_min > 0.0 && self.spawn_speed_min < self.spawn_speed_max,
            "spawn speed range [{}, {}) is empty or not moving forward",
            self.spawn_speed_min,
            self.spawn_speed_max
        );
        ensure!(self.max_x > 0.0, "max_x must be positive");
        ensure!(self.max_y >= 0.0, "max_y must not be negative");
        ensure!(
            self.speed_step > 0.0 && self.lateral_step > 0.0 && self.max_speed >= 0.0,
            "steering steps must be positive"
        );
        ensure!(
            self.collision_distance > 0.0,
            "collision_distance must be positive"
        );
        ensure!(
            self.spawn_y < self.despawn_y,
            "spawn_y must lie above despawn_y"
        );
        Ok(())
    }

    /// Axis-threshold proximity test, not a true box overlap.
    pub fn collides(&self, a: &Car, b: &Car) -> bool {
        (a.x - b.x).abs() < self.collision_distance && (a.y - b.y).abs() < self.collision_distance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Active,
    Over,
}

/// What happened during a single world tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tick {
    pub spawned: Option<Car>,
    pub culled: usize,
    pub collided: bool,
}

#[derive(Debug, Clone)]
pub struct Game {
    rules: Rules,
    state: State,
    score: u64,
    ticks: u64,
    player: Car,
    obstacles: Vec<Car>,
}

impl Game {
    pub fn new(rules: Rules) -> Result<Self> {
        Self::from_parts(rules, Car::player(), Vec::new())
    }

    /// Builds a running game from an explicit layout.
    pub fn from_parts(rules: Rules, player: Car, obstacles: Vec<Car>) -> Result<Self> {
        rules.validate()?;
        Ok(Self {
            rules,
            state: State::Active,
            score: 0,
            ticks: 0,
            player,
            obstacles,
        })
    }

    /// Throws the current run away and starts over.
    pub fn restart(&mut self) {
        self.state = State::Active;
        self.score = 0;
        self.ticks = 0;
        self.player = Car::player();
        self.obstacles.clear();
    }

    /// Steers the player. Ignored once the game is over.
    pub fn steer(&mut self, direction: Direction) -> bool {
        if self.is_over() {
            return false;
        }
        self.player = direction.apply(&self.player, &self.rules);
        trace!("steer {direction} -> {:?}", self.player);
        true
    }

    /// Advances the world by one tick. Returns `None` when the game is over.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Tick> {
        if self.is_over() {
            return None;
        }

        let before = match self.rules.collision_snapshot {
            CollisionSnapshot::PreStep => Some(self.obstacles.clone()),
            CollisionSnapshot::PostStep => None,
        };

        let culled = self.advance_obstacles();

        let spawned = self.roll_spawn(rng);
        if let Some(car) = spawned {
            debug!("spawned obstacle at x={:.1} speed={:.2}", car.x, car.speed);
            self.obstacles.push(car);
        }

        self.score += 1;
        self.ticks += 1;

        let snapshot = before.as_deref().unwrap_or(&self.obstacles);
        let collided = snapshot
            .iter()
            .any(|obstacle| self.rules.collides(obstacle, &self.player));

        if collided {
            debug!("collision at score {}", self.score);
            self.state = State::Over;
        }

        Some(Tick {
            spawned,
            culled,
            collided,
        })
    }

    /// Moves every obstacle down and drops those that left the road.
    fn advance_obstacles(&mut self) -> usize {
        let before = self.obstacles.len();
        let despawn_y = self.rules.despawn_y;

        for car in &mut self.obstacles {
            car.y += car.speed;
        }
        self.obstacles.retain(|car| car.y < despawn_y);

        let culled = before - self.obstacles.len();
        if culled > 0 {
            debug!("culled {culled} obstacle(s)");
        }
        culled
    }

    fn roll_spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Car> {
        if rng.gen::<f64>() >= self.rules.spawn_chance {
            return None;
        }
        let x = rng.gen_range(0.0..self.rules.max_x);
        let speed = rng.gen_range(self.rules.spawn_speed_min..self.rules.spawn_speed_max);
        Some(Car::obstacle(x, self.rules.spawn_y, speed))
    }

    pub const fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn is_over(&self) -> bool {
        self.state == State::Over
    }

    pub const fn score(&self) -> u64 {
        self.score
    }

    /// World ticks played since the run started.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    pub const fn player(&self) -> &Car {
        &self.player
    }

    pub fn obstacles(&self) -> &[Car] {
        &self.obstacles
    }

    /// The obstacle closest to the player, if any.
    pub fn nearest_obstacle(&self) -> Option<Car> {
        let distance = |car: &Car| (car.x - self.player.x).hypot(car.y - self.player.y);
        self.obstacles
            .iter()
            .min_by(|a, b| distance(a).total_cmp(&distance(b)))
            .copied()
    }

    pub fn frame(&self) -> Frame {
        Frame {
            player: self.player,
            obstacles: self.obstacles.clone(),
            score: self.score,
            over: self.is_over(),
        }
    }
}
