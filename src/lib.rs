//! A small, embeddable line-oriented command interpreter.
//!
//! A line of input is expanded (`$NAME` variables), split on unquoted `|` into
//! commands, and run as a pipeline: each command gets the previous command's
//! output as its input, and the first failing command stops the line.
//! Commands are either built-ins implemented in Rust (including a `grep` with
//! case folding, whole-word and literal modes and trailing context) or
//! external programs found through `PATH`.
//!
//! The main entry point is [`Interpreter`]. The public modules expose the
//! pieces for embedding: [`parser::parse`], [`pipeline::Pipeline`],
//! [`dispatch::Dispatcher`] with the [`command::CommandHandler`] trait for
//! your own commands, and [`grep::search`].

mod builtin;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod env;
pub mod error;
mod external;
pub mod grep;
mod interpreter;
pub mod lexer;
pub mod parser;
pub mod pipeline;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::{Interpreter, print_outcome};
