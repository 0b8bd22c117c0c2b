//! Waypoint file loading

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use csv::ReaderBuilder;
use log::debug;
use nalgebra::Vector3;
use std::fs::File;
use std::path::Path;

// Internal
use super::PathError;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a set of waypoints from a CSV file.
///
/// Each row holds one waypoint as `x,y,z`. The file has no header row.
pub fn load_waypoints_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Vector3<f64>>, PathError> {
    let file = File::open(path.as_ref()).map_err(PathError::WaypointFileError)?;

    let wps = parse_waypoints(file)?;

    debug!(
        "Loaded {} waypoints from {}",
        wps.len(),
        path.as_ref().display()
    );

    Ok(wps)
}

/// Parse waypoints from any CSV source.
pub(crate) fn parse_waypoints<R: std::io::Read>(reader: R) -> Result<Vec<Vector3<f64>>, PathError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut wps = Vec::new();

    for (i, record) in rdr.deserialize::<Vec<f64>>().enumerate() {
        let row = record.map_err(PathError::WaypointParseError)?;

        if row.len() != 3 {
            return Err(PathError::WrongDimension(i, row.len()));
        }

        wps.push(Vector3::new(row[0], row[1], row[2]));
    }

    Ok(wps)
}
