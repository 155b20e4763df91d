//! Strong-ownership resolution
//!
//! Keys become resolved when the value they name is known to be strongly
//! held. Conditional edges resolve their child once every owner key is
//! resolved. Resolution is monotonic and each tracker fires at most once, so
//! the final resolved set does not depend on the order in which edges are
//! registered or keys resolved.

mod error;
mod joint;
mod keys;
mod sets;

pub use error::{OwnershipError, OwnershipResult};
pub use joint::{JointOwnershipTracker, TrackerState};
pub use keys::KeyResolutions;
pub use sets::{Cascade, ChildResolver, EdgeRegistration, StrongOwnershipSets, TrackerId};
