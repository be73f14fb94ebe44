//! Reference curve store.
//!
//! - one `ReferenceCurve` per percentile: its `(week, value)` samples plus a
//!   domain-guarded cubic interpolant (`curve`)
//! - the immutable percentile → curve map built from one table (`set`)

pub mod curve;
pub mod set;

pub use curve::*;
pub use set::*;
