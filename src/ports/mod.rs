//! Ports (trait boundaries) for external dependencies.
//!
//! This module defines the interfaces between the learning core and its
//! collaborators. Agents, environments, observers and table storage are
//! all reached through these traits.

pub mod agent;
pub mod environment;
pub mod observer;
pub mod repository;

pub use agent::Agent;
pub use environment::Environment;
pub use observer::Observer;
pub use repository::TableRepository;
