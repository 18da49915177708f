//! # RCM library.
//!
//! Remote centre of motion teleoperation of a robot arm. The library holds the geometry, the
//! control module and loop, and the network clients used by the `rcm_exec` executable, so that
//! they can be tested and benchmarked on their own.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Euler angle codec - rotation matrices to and from angle triples
pub mod euler;

/// Homogeneous rigid body transforms
pub mod transform;

/// End-effector pose and conversion to and from the arm's tool vector
pub mod pose;

/// RCM control module - keeps the tool pivoting about the RCM point
pub mod rcm_ctrl;

/// Rendezvous of arm pose feedback and operator input
pub mod rendezvous;

/// Operator input mapping policies
pub mod mapping;

/// Control loop - drives RcmCtrl from the rendezvous
pub mod control_loop;

/// Arm client - receives tool poses from and sends servo demands to the arm
pub mod arm_client;

/// Joystick client - receives button presses from the joystick
pub mod joy_client;
