//! Lock command - run under a lock, inspect or force-release it

use crate::cli::args::{LockAction, LockArgs};
use crate::config::Config;
use crate::error::{KeylatchError, KeylatchResult};
use crate::lock::{LockManager, LockStatus};
use crate::store;
use console::style;
use std::process::ExitCode;
use tokio::process::Command;
use tracing::{debug, warn};

/// Execute the lock command
///
/// The manager is always shut down before returning, so any lock still
/// tracked (including after Ctrl-C) is deleted from the store.
pub async fn execute(args: LockArgs, config: &Config) -> KeylatchResult<ExitCode> {
    let store = store::connect(&config.store).await?;
    debug!("Using {} store", store.backend_name());
    let locks = LockManager::new(store, config.lock.clone());

    let result = match args.action {
        LockAction::Run { name, ttl, command } => {
            run_locked(&locks, &name, ttl.unwrap_or(0), &command).await
        }
        LockAction::Release { name } => release(&locks, &name).await,
        LockAction::Inspect { name } => inspect(&locks, &name).await,
    };

    locks.shutdown().await;
    result
}

async fn run_locked(
    locks: &LockManager,
    name: &str,
    ttl: i64,
    command: &[String],
) -> KeylatchResult<ExitCode> {
    let (program, rest) = command
        .split_first()
        .ok_or_else(|| KeylatchError::User("No command given".to_string()))?;

    if !locks.acquire_with_ttl(name, ttl).await {
        return Err(KeylatchError::LockBusy(name.to_string()));
    }
    eprintln!("{} Acquired lock {}", style("✓").green(), style(name).cyan());

    // The TTL is refreshed while the command runs, however long it takes.
    let outcome = locks.keep_alive(name, ttl, run_child(program, rest)).await;

    locks.release(name).await?;
    eprintln!("{} Released lock {}", style("✓").green(), style(name).cyan());

    let code = outcome?;
    if code != 0 {
        eprintln!(
            "{} {} exited with code {}",
            style("!").yellow(),
            program,
            code
        );
    }
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

/// Spawn the command and wait for it, killing it on Ctrl-C
async fn run_child(program: &str, args: &[String]) -> KeylatchResult<i32> {
    let mut child = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| KeylatchError::command_failed(program, e))?;

    let finished = tokio::select! {
        status = child.wait() => Some(status),
        _ = tokio::signal::ctrl_c() => None,
    };

    match finished {
        Some(status) => status
            .map_err(|e| KeylatchError::command_failed(program, e))?
            .code()
            .ok_or(KeylatchError::ProcessSignaled),
        None => {
            warn!("Interrupted, stopping {}", program);
            if let Err(e) = child.kill().await {
                warn!("Failed to kill {}: {}", program, e);
            }
            Err(KeylatchError::ProcessSignaled)
        }
    }
}

async fn release(locks: &LockManager, name: &str) -> KeylatchResult<ExitCode> {
    locks.release(name).await?;
    println!("{} Released lock {}", style("✓").green(), style(name).cyan());
    Ok(ExitCode::SUCCESS)
}

async fn inspect(locks: &LockManager, name: &str) -> KeylatchResult<ExitCode> {
    match locks.inspect(name).await? {
        LockStatus::Free => println!("{} is {}", style(name).cyan(), style("free").green()),
        LockStatus::Held { since: Some(at) } => println!(
            "{} is {} since {}",
            style(name).cyan(),
            style("held").yellow(),
            at.to_rfc3339()
        ),
        LockStatus::Held { since: None } => {
            println!("{} is {}", style(name).cyan(), style("held").yellow())
        }
    }
    Ok(ExitCode::SUCCESS)
}
