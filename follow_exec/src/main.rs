//! Path following executable entry point.
//!
//! # Architecture
//!
//! The executable runs a single path following simulation:
//!
//!     - Initialise the session and logging
//!     - Load parameters
//!     - Load the waypoints and fit the path through them
//!     - Build the track around the path
//!     - Build the controller and vehicle
//!     - Run the simulation, archiving telemetry every tick
//!     - Report the outcome
//!
//! The software root directory is given by the `FOLLOW_SW_ROOT` environment variable. Parameter
//! files are loaded from `<root>/params`, waypoints from `<root>/data` and sessions are created in
//! `<root>/sessions`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};

// Internal
use follow_lib::{
    ctrl::{self, DriverCtrl, IdleCtrl, ManualCtrl, PidCtrl, VehicleState},
    path::{self, Path},
    sim::{self, KinematicBicycle, SimManager},
    track::Track,
};
use params::{CtrlKind, FollowExecParams};
use util::{
    archive::Archiver,
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("follow_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Path Following Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: FollowExecParams =
        util::params::load("follow_exec.toml").wrap_err("Could not load exec params")?;
    let ctrl_params: ctrl::Params = util::params::load(&exec_params.ctrl_params_file)
        .wrap_err("Could not load controller params")?;
    let sim_params: sim::Params = util::params::load(&exec_params.sim_params_file)
        .wrap_err("Could not load simulation params")?;

    info!("Exec parameters loaded");

    // ---- PATH AND TRACK ----

    let wps_path = host::get_data_file(&exec_params.waypoints_file)
        .wrap_err("Could not resolve the waypoint file path")?;
    let wps = path::load_waypoints_csv(&wps_path)
        .wrap_err_with(|| format!("Could not load waypoints from {:?}", wps_path))?;

    let center = Path::fit(&wps, &exec_params.spline).wrap_err("Could not fit the path")?;

    if center.closure_downgraded() {
        warn!("The path was fitted open as the waypoint loop is not closed");
    }

    info!(
        "Fitted {} path of {:.2} m through {} waypoints",
        if center.is_closed() { "closed" } else { "open" },
        center.total_length(),
        wps.len()
    );

    let track = Track::constant_width(&center, exec_params.track_width_m)
        .wrap_err("Could not build the track")?;

    session.save("track.json", track.clone());

    // ---- CONTROLLER AND VEHICLE ----

    let driver = match exec_params.ctrl {
        CtrlKind::Pid => DriverCtrl::Pid(
            PidCtrl::new(&ctrl_params, center.clone())
                .wrap_err("Could not create the PID controller")?,
        ),
        CtrlKind::Manual => {
            let mut manual = ManualCtrl::new(&ctrl_params)
                .wrap_err("Could not create the manual controller")?;
            for timed in exec_params.manual_script.iter() {
                manual.schedule(timed.time_s, timed.cmd);
            }
            DriverCtrl::Manual(manual)
        }
        CtrlKind::Idle => DriverCtrl::Idle(IdleCtrl::default()),
    };

    let initial_state = match sim_params.initial_state {
        Some([x, y, heading, speed]) => VehicleState::new(x, y, heading, speed),
        None => sim::state_at_path_start(&center, 0.0)
            .wrap_err("Could not find the start of the path")?,
    };

    info!("Vehicle starts at {:?}", initial_state);

    let vehicle = KinematicBicycle::new(exec_params.vehicle.clone(), initial_state);

    // ---- SIMULATION ----

    let arch = Archiver::from_path(&session, "telemetry.csv")
        .wrap_err("Could not create the telemetry archive")?;

    let mut sim = SimManager::new(driver, vehicle, Some(track), sim_params.step_s)
        .wrap_err("Could not create the simulation")?
        .with_archiver(arch);

    let report = sim
        .run(sim_params.end_time_s)
        .wrap_err("Simulation failed")?;

    info!(
        "Simulation complete: {} steps, {:.2} s, {} steps outside the track, max cross-track {:.3} m",
        report.num_steps,
        report.final_time_s,
        report.num_outside_track,
        report.max_cross_track_m
    );

    session.save("report.json", report);

    // ---- SHUTDOWN ----

    session.exit();

    Ok(())
}
