//! TUI debugger for the LS-8 emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register and flag visualization
//! - Memory hex dump
//! - Step/run/breakpoint controls
//! - Disassembly and console output views

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
