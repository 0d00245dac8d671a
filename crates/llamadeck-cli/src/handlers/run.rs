//! Run command handler.
//!
//! Starts (or adopts) llama-server and keeps it supervised until Ctrl-C or
//! until the child dies.

use anyhow::{Context, Result, bail};
use llamadeck_core::{ServerState, ServerStatus};
use llamadeck_runtime::ServerSupervisor;
use tokio::sync::watch;

/// Execute the run command.
pub async fn execute(supervisor: &ServerSupervisor) -> Result<()> {
    println!("Starting llama-server on {}", supervisor.config().base_url());

    let mut updates = supervisor.subscribe();
    supervisor
        .start()
        .await
        .context("llama-server failed to start")?;
    print_ready(&supervisor.state());
    println!("Press Ctrl-C to stop");

    let outcome = wait_for_shutdown(&mut updates).await;
    supervisor.stop().await;
    outcome
}

async fn wait_for_shutdown(updates: &mut watch::Receiver<ServerState>) -> Result<()> {
    loop {
        let state = updates.borrow_and_update().clone();
        if state.status == ServerStatus::Error {
            bail!(
                "{}",
                state
                    .last_error
                    .unwrap_or_else(|| "llama-server stopped".to_string())
            );
        }

        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                println!("\nShutting down llama-server...");
                return Ok(());
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
        }
    }
}

fn print_ready(state: &ServerState) {
    match (state.external, state.pid) {
        (true, _) => println!("Using llama-server that was already running"),
        (false, Some(pid)) => println!("llama-server ready (pid {pid})"),
        (false, None) => println!("llama-server ready"),
    }
    if state.models.is_empty() {
        println!("No models reported");
    } else {
        println!("Models:");
        for model in &state.models {
            println!("  {}", model.id);
        }
    }
}
