//! Season-long college football rating and 12-team playoff selection.
//!
//! A raw schedule feed is normalized into a [`game_log::GameLog`], rated by
//! five independent systems (Colley, Massey, Elo, strength of record,
//! strength of schedule), fused into one composite table, and handed to the
//! conference resolver and the 5+7 playoff selector. [`pipeline::run_season`]
//! wires the whole thing together.

pub mod colley;
pub mod composite;
pub mod conference;
pub mod config;
pub mod elo;
pub mod error;
pub mod export;
pub mod game_log;
pub mod massey;
pub mod pipeline;
pub mod playoff;
pub mod schedule;
