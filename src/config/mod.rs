//! Configuration module
//!
//! Contains the player configuration and the stage layout.

mod player_config;

pub use player_config::*;
