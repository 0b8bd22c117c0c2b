//! # Simulation
//!
//! Runs a controller and a vehicle together in a fixed step loop. Each tick
//! is made of the following phases, in order:
//!
//!  1. the controller is synchronized with the time and vehicle state,
//!  2. the vehicle is synchronized with the time and current controller inputs,
//!  3. the controller is advanced by one step,
//!  4. the vehicle is advanced by one step.
//!
//! If a track is given the manager checks after every tick whether the
//! vehicle is still inside it, and tracks the distance to the centerline.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod vehicle;

pub use params::Params;
pub use vehicle::{BicycleParams, KinematicBicycle, Vehicle};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;

// Internal
use crate::{
    ctrl::{Controller, CtrlError, DriverCtrl, VehicleInputs, VehicleState},
    path::{Path, PathError},
    track::{Track, TrackError},
};
use util::archive::{ArchiveError, Archived, Archiver};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Runs the simulation loop.
pub struct SimManager<V: Vehicle> {
    ctrl: DriverCtrl,
    vehicle: V,
    track: Option<Track>,

    /// Length of a tick
    step_s: f64,

    /// Current simulation time
    time_s: f64,

    arch: Archiver,

    /// Last recorded telemetry
    record: Option<TelemetryRecord>,

    report: SimReport,
}

/// One row of the telemetry archive.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryRecord {
    pub time_s: f64,
    pub x_m: f64,
    pub y_m: f64,
    pub heading_rad: f64,
    pub speed_ms: f64,
    pub steering: f64,
    pub throttle: f64,
    pub braking: f64,
    pub target_x_m: Option<f64>,
    pub target_y_m: Option<f64>,
    pub sentinel_x_m: Option<f64>,
    pub sentinel_y_m: Option<f64>,
    pub inside_track: Option<bool>,
    pub cross_track_m: Option<f64>,
}

/// Summary of a simulation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimReport {
    /// Number of ticks executed
    pub num_steps: usize,

    /// Simulation time at the end of the run
    pub final_time_s: f64,

    /// Number of ticks after which the vehicle was outside the track
    pub num_outside_track: usize,

    /// Largest distance between the vehicle and the track centerline
    pub max_cross_track_m: f64,

    /// Final state of the vehicle
    pub final_state: Option<VehicleState>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Simulation step must be finite and positive, found {0}")]
    InvalidStep(f64),

    #[error("Controller error at t = {0:.3} s: {1}")]
    CtrlError(f64, CtrlError),

    #[error("Track error: {0}")]
    TrackError(#[from] TrackError),

    #[error("Path error: {0}")]
    PathError(#[from] PathError),

    #[error("Could not archive telemetry: {0}")]
    ArchiveError(#[from] ArchiveError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<V: Vehicle> SimManager<V> {
    /// Create a new simulation.
    ///
    /// Telemetry is discarded unless an archiver is attached with
    /// [`SimManager::with_archiver`].
    pub fn new(
        ctrl: DriverCtrl,
        vehicle: V,
        track: Option<Track>,
        step_s: f64,
    ) -> Result<Self, SimError> {
        if !step_s.is_finite() || step_s <= 0.0 {
            return Err(SimError::InvalidStep(step_s));
        }

        Ok(Self {
            ctrl,
            vehicle,
            track,
            step_s,
            time_s: 0.0,
            arch: Archiver::default(),
            record: None,
            report: SimReport::default(),
        })
    }

    /// Attach an archiver to which telemetry is written every tick.
    pub fn with_archiver(mut self, arch: Archiver) -> Self {
        self.arch = arch;
        self
    }

    /// Execute one tick of the simulation.
    pub fn step(&mut self) -> Result<(), SimError> {
        let state = self.vehicle.get_state();

        self.ctrl.synchronize(self.time_s, &state);
        self.vehicle.synchronize(self.time_s, &self.ctrl.get_inputs());

        self.ctrl
            .advance(self.step_s)
            .map_err(|e| SimError::CtrlError(self.time_s, e))?;
        self.vehicle.advance(self.step_s);

        self.time_s += self.step_s;
        self.report.num_steps += 1;
        self.report.final_time_s = self.time_s;

        self.record_tick()?;
        self.write()?;

        Ok(())
    }

    /// Run the simulation until `end_time_s`, returning the report.
    pub fn run(&mut self, end_time_s: f64) -> Result<SimReport, SimError> {
        let num_steps = util::time::num_steps(end_time_s - self.time_s, self.step_s);

        info!(
            "Running {} controller for {} steps of {} s",
            self.ctrl.name(),
            num_steps,
            self.step_s
        );

        for _ in 0..num_steps {
            self.step()?;
        }

        if self.report.num_outside_track > 0 {
            warn!(
                "Vehicle left the track on {} of {} steps",
                self.report.num_outside_track, self.report.num_steps
            );
        }

        Ok(self.report.clone())
    }

    /// Check the vehicle against the track and build the telemetry record.
    fn record_tick(&mut self) -> Result<(), SimError> {
        let state = self.vehicle.get_state();
        let inputs: VehicleInputs = self.ctrl.get_inputs();

        let (inside_track, cross_track_m) = match self.track {
            Some(ref track) => {
                let pos_m = state.position_m;
                let inside = track.inside_boundaries(&pos_m)?;
                let (closest_m, _) = track.center().closest_point(&pos_m)?;
                let dist_m = (closest_m - pos_m).xy().norm();

                if !inside {
                    if self.report.num_outside_track == 0 {
                        debug!("Vehicle left the track at t = {:.3} s", self.time_s);
                    }
                    self.report.num_outside_track += 1;
                }
                self.report.max_cross_track_m = self.report.max_cross_track_m.max(dist_m);

                (Some(inside), Some(dist_m))
            }
            None => (None, None),
        };

        let (target, sentinel) = match self.ctrl {
            DriverCtrl::Pid(ref c) => (Some(c.target()), Some(c.sentinel())),
            _ => (None, None),
        };

        self.report.final_state = Some(state);
        self.record = Some(TelemetryRecord {
            time_s: self.time_s,
            x_m: state.position_m.x,
            y_m: state.position_m.y,
            heading_rad: state.heading_rad,
            speed_ms: state.speed_ms,
            steering: inputs.steering,
            throttle: inputs.throttle,
            braking: inputs.braking,
            target_x_m: target.map(|t| t.x),
            target_y_m: target.map(|t| t.y),
            sentinel_x_m: sentinel.map(|s| s.x),
            sentinel_y_m: sentinel.map(|s| s.y),
            inside_track,
            cross_track_m,
        });

        Ok(())
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    pub fn vehicle(&self) -> &V {
        &self.vehicle
    }

    pub fn ctrl(&self) -> &DriverCtrl {
        &self.ctrl
    }

    pub fn report(&self) -> &SimReport {
        &self.report
    }
}

impl<V: Vehicle> Archived for SimManager<V> {
    fn write(&mut self) -> Result<(), ArchiveError> {
        match self.record {
            Some(ref r) => self.arch.serialise(r),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Get a vehicle state on the first sample of `path`, facing along the path.
pub fn state_at_path_start(path: &Path, speed_ms: f64) -> Result<VehicleState, PathError> {
    let start_m = path.points().first().ok_or(PathError::EmptyPath)?;

    let heading_rad = match path.derivatives() {
        Some(d) if !d.is_empty() => d[0].y.atan2(d[0].x),
        _ => match path.points().get(1) {
            Some(next_m) => (next_m.y - start_m.y).atan2(next_m.x - start_m.x),
            None => 0.0,
        },
    };

    Ok(VehicleState::new(start_m.x, start_m.y, heading_rad, speed_ms))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ctrl::{self, IdleCtrl, PidCtrl};
    use crate::path::SplineParams;
    use nalgebra::Vector3;
    use std::f64::consts::TAU;

    fn circle_track(radius: f64, width: f64) -> Track {
        let mut wps: Vec<Vector3<f64>> = (0..16)
            .map(|i| {
                let a = TAU * i as f64 / 16.0;
                Vector3::new(radius * a.cos(), radius * a.sin(), 0.0)
            })
            .collect();
        wps.push(wps[0]);

        let params = SplineParams {
            num_samples: 1000,
            is_closed: true,
            ..Default::default()
        };
        let center = Path::fit(&wps, &params).unwrap();

        Track::constant_width(&center, width).unwrap()
    }

    #[test]
    fn test_invalid_step() {
        let vehicle = KinematicBicycle::new(BicycleParams::default(), VehicleState::new(0.0, 0.0, 0.0, 0.0));
        assert!(matches!(
            SimManager::new(DriverCtrl::Idle(IdleCtrl::default()), vehicle, None, 0.0),
            Err(SimError::InvalidStep(_))
        ));
    }

    #[test]
    fn test_idle_run_without_track() {
        let vehicle = KinematicBicycle::new(BicycleParams::default(), VehicleState::new(0.0, 0.0, 0.0, 0.0));
        let ctrl = DriverCtrl::Idle(IdleCtrl::new(VehicleInputs::new(0.0, 0.5, 0.0)));

        let mut sim = SimManager::new(ctrl, vehicle, None, 0.1).unwrap();
        let report = sim.run(1.0).unwrap();

        assert_eq!(report.num_steps, 10);
        assert!((report.final_time_s - 1.0).abs() < 1e-9);
        assert_eq!(report.num_outside_track, 0);

        // Half throttle accelerates at 1.5 m/s^2
        let state = report.final_state.unwrap();
        assert!((state.speed_ms - 1.5).abs() < 1e-9);
        assert!(state.position_m.x > 0.0);
    }

    #[test]
    fn test_pid_follows_closed_track() {
        let track = circle_track(30.0, 6.0);
        let start = state_at_path_start(track.center(), 0.0).unwrap();

        // Starts at (30, 0) facing +y
        assert!((start.heading_rad - TAU / 4.0).abs() < 1e-6);

        let ctrl = PidCtrl::new(&ctrl::Params::default(), track.center().clone()).unwrap();
        let vehicle = KinematicBicycle::new(BicycleParams::default(), start);

        let mut sim = SimManager::new(DriverCtrl::Pid(ctrl), vehicle, Some(track), 0.01).unwrap();
        let report = sim.run(60.0).unwrap();

        assert_eq!(report.num_steps, 6000);
        assert_eq!(report.num_outside_track, 0);
        assert!(report.max_cross_track_m < 1.0);

        // Close to the target speed by the end
        let state = report.final_state.unwrap();
        assert!((state.speed_ms - 7.0).abs() < 0.5);
    }

    #[test]
    fn test_ctrl_error_is_reported() {
        let path = Path::from_points(Vec::new(), false);
        let ctrl = PidCtrl::new(&ctrl::Params::default(), path).unwrap();
        let vehicle = KinematicBicycle::new(BicycleParams::default(), VehicleState::new(0.0, 0.0, 0.0, 0.0));

        let mut sim = SimManager::new(DriverCtrl::Pid(ctrl), vehicle, None, 0.01).unwrap();
        assert!(matches!(sim.step(), Err(SimError::CtrlError(_, CtrlError::PathError(_)))));
    }
}
