//! Controller which holds fixed inputs

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A controller which ignores the vehicle and always outputs the same inputs.
#[derive(Debug, Clone, Default)]
pub struct IdleCtrl {
    inputs: VehicleInputs,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl IdleCtrl {
    pub fn new(inputs: VehicleInputs) -> Self {
        Self { inputs }
    }
}

impl Controller for IdleCtrl {
    fn synchronize(&mut self, _time_s: f64, _state: &VehicleState) {}

    fn advance(&mut self, step_s: f64) -> Result<(), CtrlError> {
        check_step(step_s)
    }

    fn get_inputs(&self) -> VehicleInputs {
        self.inputs
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_inputs_are_constant() {
        let mut ctrl = DriverCtrl::Idle(IdleCtrl::new(VehicleInputs::new(0.1, 0.5, 0.0)));

        ctrl.synchronize(0.0, &VehicleState::new(1.0, 2.0, 0.3, 4.0));
        ctrl.advance(0.1).unwrap();

        assert_eq!(ctrl.get_inputs(), VehicleInputs::new(0.1, 0.5, 0.0));
        assert_eq!(ctrl.name(), "idle");
    }
}
