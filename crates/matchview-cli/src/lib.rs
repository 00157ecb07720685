//! Library components of the `matchview` command-line tool.

pub mod logging;
pub mod settings;
