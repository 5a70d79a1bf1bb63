//! Dodge oncoming traffic.
//!
//! The player's car sits near the bottom of the road while other cars spawn
//! at the top and drive down. Every tick survived scores a point; touching an
//! oncoming car ends the run.

pub mod action;
pub mod car;
pub mod config;
pub mod game;
pub mod log;
pub mod render;
pub mod runtime;
pub mod session;
