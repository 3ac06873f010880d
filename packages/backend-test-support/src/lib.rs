//! Backend test support utilities
//!
//! Logging initialisation shared by unit and integration tests, unique id
//! generation for wizards/players, and problem-details assertions for HTTP tests.

pub mod logging;
pub mod problem_details;
pub mod unique_helpers;
