//! Afterstate Q-learning
//!
//! Values are kept per afterstate rather than per (state, action) pair. The
//! update is off-policy:
//!
//! ```text
//! V(a) ← V(a) + α[r + γ max_a' V(a') - V(a)]
//! ```
//!
//! where `a'` ranges over the afterstates reachable from the next decision
//! state and the bootstrap term is 0 when the game is over.
//!
//! ## Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use afterstate::{
//!     afterstates::AfterstateTable,
//!     q_learning::AfterstateAgent,
//!     tictactoe::Variant,
//! };
//!
//! let table = Arc::new(AfterstateTable::build(Variant::Standard)?);
//! let agent = AfterstateAgent::new(
//!     table, // afterstate table
//!     0.1,   // learning_rate
//!     0.9,   // discount_factor
//!     0.5,   // epsilon (exploration)
//!     true,  // explore
//! )
//! .with_seed(42);
//! # Ok::<(), afterstate::Error>(())
//! ```

pub mod agent;
pub mod serialization;
pub mod value_table;

// Public re-exports
pub use agent::AfterstateAgent;
pub use value_table::ValueTable;
