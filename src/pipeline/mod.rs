//! Self-play and evaluation pipelines
//!
//! This module provides:
//! - The self-play training driver
//! - Match play between two agents
//! - Observers recording what happens during training

pub mod evaluation;
pub mod observers;
pub mod self_play;

pub use evaluation::{HeadToHead, MatchResult, head_to_head, play_match};
// Re-export observer implementations (adapters)
pub use observers::{
    JsonlObserver, MetricsObserver, MetricsSummary, MilestoneObserver, Observation,
    ProgressObserver, SampleLogObserver, SharedObserver, StepObservation,
};
pub use self_play::{SelfPlay, TrainingResult};

pub use crate::ports::{Agent, Environment, Observer};
