//! # Equipment Interface
//!
//! This module defines the interface structures which are exchanged with the arm controller and
//! the joystick driver.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod arm;
pub mod joy;
