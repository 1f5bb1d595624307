//! Infrastructure configuration modules.

pub mod logging;
pub mod reconnection;
pub mod settings;
