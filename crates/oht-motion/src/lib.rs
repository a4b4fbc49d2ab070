//! `oht-motion` — per-tick kinematics for the ohtsim kernel.
//!
//! One module, one job: [`MotionIntegrator`] advances every moving vehicle
//! (speed → ratio → transitions → pose) in ascending id order.  It owns the
//! kinematic columns of the vehicle store and the `SENSORED` stop bit;
//! everything lock-related arrives pre-digested in `moving_status` and is
//! only touched through the lock manager's transition hook.

pub mod integrator;


pub use integrator::MotionIntegrator;
