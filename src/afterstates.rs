//! Afterstate tables: every legal (state, action) pair mapped to the board it
//! produces, with afterstates numbered densely for value storage.

pub mod fingerprint;
pub mod table;

pub use fingerprint::Fnv1a;
pub use table::{AfterstateId, AfterstateTable};
