//! Collaborators for running the chat core off-device.
//!
//! `fs` and `device` back the terminal front end; `test` holds scripted doubles.

pub mod device;
pub mod fs;
