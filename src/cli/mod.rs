//! Command-line interface for the `zlibr` binary.
//!
//! | Submodule     | Responsibility |
//! |---------------|---------------|
//! | [`constants`] | Program identity strings, the display-level accessors and the `display*` macros. |
//! | [`help`]      | About / long-help text and the verbose banner. |
//! | [`op_mode`]   | `OpMode`, alias detection from the binary name, environment defaults. |
//! | [`args`]      | clap definition of the command line and its conversion to `ParsedArgs`. |
//!
//! Typical call sequence: `parse_args` → dispatch to the I/O layer.

pub mod constants;
pub mod help;
pub mod op_mode;
pub mod args;
