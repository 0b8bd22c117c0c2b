//! # Manual controller
//!
//! Drives the vehicle from discrete commands, such as key presses. Each
//! command nudges the steering, throttle or braking target by a fixed delta,
//! and the actual inputs follow the targets through a rate limiter.
//!
//! Commands are either pushed to be applied at the next synchronize, or
//! scheduled for a given simulation time.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

// Internal
use super::*;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct ManualCtrl {
    limiter: RateLimiter,

    /// (steering, throttle, braking) targets
    targets: [f64; 3],

    /// Change in each target for one command
    deltas: [f64; 3],

    /// Commands to apply at the next synchronize
    pending: VecDeque<ManualCmd>,

    /// Commands to apply at a given time, in time order
    scheduled: VecDeque<(f64, ManualCmd)>,
}

/// A command scheduled at a time, as found in parameter files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimedCmd {
    pub time_s: f64,
    pub cmd: ManualCmd,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualCmd {
    /// Open the throttle, releasing the brakes faster once throttle is applied
    Accelerate,

    /// Close the throttle, then apply the brakes once it is shut
    Decelerate,

    SteerLeft,
    SteerRight,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ManualCtrl {
    pub fn new(params: &Params) -> Result<Self, CtrlError> {
        Ok(Self {
            limiter: RateLimiter::new(
                params.native_step_s,
                params.actuator_gains,
                params.actuator_max_deltas,
            )?,
            targets: [0.0; 3],
            deltas: params.manual_target_deltas,
            pending: VecDeque::new(),
            scheduled: VecDeque::new(),
        })
    }

    /// Queue a command to be applied at the next synchronize.
    pub fn push(&mut self, cmd: ManualCmd) {
        self.pending.push_back(cmd);
    }

    /// Schedule a command for the first synchronize at or after `time_s`.
    pub fn schedule(&mut self, time_s: f64, cmd: ManualCmd) {
        let idx = self.scheduled.partition_point(|(t, _)| *t <= time_s);
        self.scheduled.insert(idx, (time_s, cmd));
    }

    /// Current (steering, throttle, braking) targets
    pub fn targets(&self) -> VehicleInputs {
        VehicleInputs::from_array(self.targets)
    }

    fn apply(&mut self, cmd: ManualCmd) {
        let [d_steer, d_throttle, d_brake] = self.deltas;
        let [steering, throttle, braking] = &mut self.targets;

        match cmd {
            ManualCmd::Accelerate => {
                *throttle = clamp(*throttle + d_throttle, 0.0, 1.0);
                if *throttle > 0.0 {
                    *braking = clamp(*braking - d_brake * 3.0, 0.0, 1.0);
                }
            }
            ManualCmd::Decelerate => {
                *throttle = clamp(*throttle - d_throttle * 3.0, 0.0, 1.0);
                if *throttle <= 0.0 {
                    *braking = clamp(*braking + d_brake, 0.0, 1.0);
                }
            }
            ManualCmd::SteerLeft => *steering = clamp(*steering + d_steer, -1.0, 1.0),
            ManualCmd::SteerRight => *steering = clamp(*steering - d_steer, -1.0, 1.0),
        }

        debug!("ManualCtrl: {:?} -> targets {:?}", cmd, self.targets);
    }
}

impl Controller for ManualCtrl {
    fn synchronize(&mut self, time_s: f64, _state: &VehicleState) {
        while let Some(cmd) = self.pending.pop_front() {
            self.apply(cmd);
        }

        while let Some(&(t, cmd)) = self.scheduled.front() {
            if t > time_s {
                break;
            }
            self.scheduled.pop_front();
            self.apply(cmd);
        }
    }

    fn advance(&mut self, step_s: f64) -> Result<(), CtrlError> {
        check_step(step_s)?;

        let targets = VehicleInputs::from_array(self.targets);
        self.limiter.advance(step_s, &targets);

        Ok(())
    }

    fn get_inputs(&self) -> VehicleInputs {
        self.limiter.output()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn state() -> VehicleState {
        VehicleState::new(0.0, 0.0, 0.0, 0.0)
    }

    fn params() -> Params {
        Params {
            manual_target_deltas: [0.125, 0.125, 0.125],
            ..Default::default()
        }
    }

    #[test]
    fn test_targets_are_clipped() {
        let mut ctrl = ManualCtrl::new(&params()).unwrap();

        for _ in 0..15 {
            ctrl.push(ManualCmd::Accelerate);
            ctrl.push(ManualCmd::SteerRight);
        }
        ctrl.synchronize(0.0, &state());

        let t = ctrl.targets();
        assert_eq!(t.throttle, 1.0);
        assert_eq!(t.steering, -1.0);
        assert_eq!(t.braking, 0.0);
    }

    #[test]
    fn test_decelerate_then_brake() {
        let mut ctrl = ManualCtrl::new(&params()).unwrap();

        ctrl.push(ManualCmd::Accelerate);
        ctrl.push(ManualCmd::Accelerate);
        ctrl.push(ManualCmd::Accelerate);
        ctrl.synchronize(0.0, &state());
        assert_eq!(ctrl.targets().throttle, 0.375);

        // Throttle shut in one command, brakes on from the first command after
        ctrl.push(ManualCmd::Decelerate);
        ctrl.synchronize(0.1, &state());
        assert_eq!(ctrl.targets().throttle, 0.0);
        assert_eq!(ctrl.targets().braking, 0.125);

        ctrl.push(ManualCmd::Decelerate);
        ctrl.synchronize(0.2, &state());
        assert_eq!(ctrl.targets().braking, 0.25);

        // Accelerating releases the brakes three times faster
        ctrl.push(ManualCmd::Accelerate);
        ctrl.synchronize(0.3, &state());
        assert_eq!(ctrl.targets().braking, 0.0);
    }

    #[test]
    fn test_scheduled_commands() {
        let mut ctrl = ManualCtrl::new(&params()).unwrap();

        ctrl.schedule(1.0, ManualCmd::SteerLeft);
        ctrl.schedule(0.5, ManualCmd::SteerLeft);

        ctrl.synchronize(0.4, &state());
        assert_eq!(ctrl.targets().steering, 0.0);

        ctrl.synchronize(0.5, &state());
        assert_eq!(ctrl.targets().steering, 0.125);

        ctrl.synchronize(2.0, &state());
        assert_eq!(ctrl.targets().steering, 0.25);
    }

    #[test]
    fn test_inputs_are_rate_limited() {
        let mut ctrl = ManualCtrl::new(&params()).unwrap();

        for _ in 0..10 {
            ctrl.push(ManualCmd::SteerLeft);
        }
        ctrl.synchronize(0.0, &state());
        ctrl.advance(0.001).unwrap();

        // One native step of 1e-3 * 4 * 1.0
        assert!((ctrl.get_inputs().steering - 0.004).abs() < 1e-9);
    }
}
