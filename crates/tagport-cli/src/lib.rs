//! Tagport command-line client.
//!
//! Each invocation opens the local database, restores the remembered reader
//! where the command needs one, runs a single action and exits. The
//! remembered reader is what carries a connection from one invocation to
//! the next.

pub mod app;
pub mod cli;
pub mod commands;
pub mod console;
