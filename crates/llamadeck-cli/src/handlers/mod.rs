//! Command handlers.
//!
//! Each handler is `pub async fn execute(...) -> Result<()>`: it takes the
//! resolved configuration, calls into the runtime and formats the result for
//! the terminal.

pub mod args;
pub mod models;
pub mod probe;
pub mod run;
