//! Afterstate Q-learning for tic-tac-toe through self-play
//!
//! This crate provides:
//! - Tic-Tac-Toe boards with base-3 codes, seen from the side to move
//! - A capture variant where placing a marker flips its neighbours and a
//!   single pass is allowed
//! - An afterstate table enumerating every decision state once per variant
//! - A tabular agent learning the value of afterstates by self-play
//! - Evaluation against a random agent and between saved agents

pub mod adapters;
pub mod afterstates;
pub mod app;
pub mod cli;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod tictactoe;

pub use error::{Error, Result};
