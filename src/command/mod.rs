//! Command Module
//!
//! The operation surface exposed to shells (CLI, REPL, test harnesses).
//!
//! ## Text Syntax
//! ```text
//! search <key>
//! add    <key> <data...>
//! edit   <key> <data...>
//! delete <key>
//! fill   [count]       (default 10000)
//! stats  [attempts]    (default 15)
//! info
//! ```
//!
//! Keys are signed 64-bit integers. Data is the rest of the line.
//! Formatting responses for people is left to the shell.

mod request;
mod parse;
mod response;

pub use request::{Command, DEFAULT_FILL_COUNT, DEFAULT_STATS_ATTEMPTS};
pub use parse::{parse_command, parse_key};
pub use response::Response;
