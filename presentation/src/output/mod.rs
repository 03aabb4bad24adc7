//! Output formatting for console display

pub mod console;
