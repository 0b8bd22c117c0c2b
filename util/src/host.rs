//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::env;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the environment variable pointing at the software root directory.
///
/// The root contains the `params`, `data` and `sessions` directories.
pub const SW_ROOT_ENV_VAR: &str = "FOLLOW_SW_ROOT";

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the software root directory from the `FOLLOW_SW_ROOT` environment
/// variable.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

/// Resolve a path relative to the software root's `data` directory.
///
/// Absolute paths are returned unchanged.
pub fn get_data_file(file: &str) -> Result<PathBuf, env::VarError> {
    let file_path = PathBuf::from(file);

    if file_path.is_absolute() {
        return Ok(file_path);
    }

    let mut path = get_sw_root()?;
    path.push("data");
    path.push(file_path);

    Ok(path)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_absolute_data_file_unchanged() {
        let path = get_data_file("/tmp/waypoints.csv").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/waypoints.csv"));
    }
}
