//! joulemeter library
//!
//! Energy accounting for the local machine, exposed for the binaries
//! and for tests.

pub mod core;
pub mod energy;
pub mod machine;
pub mod report;
