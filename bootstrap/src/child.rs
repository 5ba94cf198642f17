//! Spawns the interpreter as a child process running the embedded
//! dispatcher source, and waits for it to bind the Unix domain socket
//! the two processes speak HTTP/1.1 over (spec §9 Design Notes, option
//! (c)).
use std::{path::Path, time::Duration};

use tokio::{process::Child, time::sleep};

const DISPATCH_SOCKET_VAR: &str = "BUN_LAMBDA_DISPATCH_SOCKET";
const READY_POLL_INTERVAL: Duration = Duration::from_millis(20);
const READY_POLL_ATTEMPTS: u32 = 250; // ~5s

/// Execs the interpreter at `interpreter_path` with `dispatcher_source` as
/// its argument, working directory set to `task_root`, and the dispatch
/// socket path passed through the environment. Returns once the child has
/// bound the socket (or the child has exited, or the poll window elapses).
pub async fn spawn(
    interpreter_path: &Path,
    dispatcher_source: &Path,
    task_root: &Path,
    socket_path: &Path,
) -> std::io::Result<Child> {
    let _ = std::fs::remove_file(socket_path);

    let mut child = tokio::process::Command::new(interpreter_path)
        .arg(dispatcher_source)
        .current_dir(task_root)
        .env(DISPATCH_SOCKET_VAR, socket_path)
        .kill_on_drop(true)
        .spawn()?;

    for _ in 0..READY_POLL_ATTEMPTS {
        if socket_path.exists() {
            return Ok(child);
        }
        if let Some(status) = child.try_wait()? {
            return Err(std::io::Error::other(format!("dispatcher process exited before binding its socket: {status}")));
        }
        sleep(READY_POLL_INTERVAL).await;
    }

    Err(std::io::Error::other("dispatcher process did not bind its socket in time"))
}
