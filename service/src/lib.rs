//! Process-wide plumbing shared by the realtime services: command line and
//! environment configuration, plus console logging.

pub mod config;
pub mod logging;
