//! Command-line interface: training, evaluation and interactive play

pub mod commands;
pub mod output;
