//! Line protocol for the command-line front end.
//!
//! Each input line is one command; each reply is one line starting with a
//! keyword (`readyok`, `territory`, `settled`, `territories`, `bonus`, `now`,
//! `error`) followed by JSON or plain values.

pub mod parser;

pub use parser::{parse_command, parse_duration, Command};
