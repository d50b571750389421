//! Facade over the graph-cut stereo workspace.
//!
//! Re-exports the member crates under short names so applications can
//! depend on a single crate:
//!
//! ```
//! use kzmatch::stereo::{Matcher, Parameters};
//! ```

pub use kz_core as core;
pub use kz_io as io;
pub use kz_maxflow as maxflow;
pub use kz_stereo as stereo;
