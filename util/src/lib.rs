//! Utility library for the path following workspace
//!
//! Provides the ambient pieces shared by executables: session directories,
//! logging, parameter loading and CSV archiving.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod archive;
pub mod host;
pub mod logger;
pub mod maths;
pub mod params;
pub mod session;
pub mod time;
