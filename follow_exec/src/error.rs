//! Error classification shared by the library modules

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Broad category of a library error.
///
/// Each module keeps its own error enum, `kind()` on those enums maps them
/// onto these categories so callers can react without matching every variant.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An input was malformed: too few points, a non-positive width or step.
    Validation,

    /// An operation was called on an object in the wrong state, for example
    /// querying an empty path.
    Precondition,

    /// Reading or writing a file failed.
    Io,
}
