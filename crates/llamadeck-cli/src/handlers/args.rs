//! Args command handler.

use anyhow::Result;
use llamadeck_core::ServerConfig;
use llamadeck_runtime::build_args;

/// Print the binary and its arguments, one argument per line.
pub fn execute(config: &ServerConfig) -> Result<()> {
    println!("{}", config.binary_path.display());
    for arg in build_args(config) {
        println!("  {arg}");
    }
    Ok(())
}
