//! Harborwatch Core
//!
//! Platform-independent vessel monitoring algorithms: great-circle math,
//! collision risk (CPA/TCPA), geofencing, clustering and track history.
//!
//! Every algorithm works on plain vessel snapshots and takes the current
//! time explicitly, so the crate has no I/O and no global state. A
//! [`session::Session`] bundles the stateful stores for a host that feeds
//! vessel updates and runs periodic sweeps.
//!
//! # Modules
//!
//! - [`geo`]: distance, bearing, positions and bounding boxes
//! - [`vessel`]: vessel state, partial updates and the capped vessel store
//! - [`collision`]: CPA/TCPA, risk levels, pairwise sweep, alert suppression
//! - [`geofence`]: zones, point-in-zone tests, enter/exit/dwell events
//! - [`clustering`]: DBSCAN and grid clustering plus merge/filter steps
//! - [`tracks`]: per-vessel position history with distance travelled
//! - [`notifications`]: user-facing notification list with read state
//! - [`session`]: owns all of the above for one monitoring session

pub mod clock;
pub mod clustering;
pub mod collision;
pub mod geo;
pub mod geofence;
pub mod notifications;
pub mod session;
pub mod tracks;
pub mod vessel;

pub use clock::{Clock, ManualClock, SystemClock};
pub use geo::Position;
pub use session::{Session, SessionSettings, TickReport};
pub use vessel::{VesselId, VesselState, VesselUpdate};
