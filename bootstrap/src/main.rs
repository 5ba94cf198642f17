//! The binary the platform execs on cold start (spec §4.3 Bootstrap
//! Shim), merged with the Runtime Dispatcher (spec §4.4) it execs into.
//!
//! Per spec §9 Design Notes, dynamic handler loading becomes an
//! out-of-process model: this process prepares the environment, spawns
//! the interpreter running the dispatcher source at `runtime/index.js`
//! as a child, and then drives the ordinary control-plane event loop
//! (`bun_lambda_http::run`), proxying each translated request to the
//! child over a Unix domain socket instead of calling a handler in
//! process.
mod child;
mod env;
mod proxy;

use std::path::{Path, PathBuf};

use bun_lambda_http::{service_fn, Error};

/// Where the dispatcher child's Unix domain socket is bound. Process-private;
/// `/tmp` is the only writable location in the function container (spec §6).
const SOCKET_PATH: &str = "/tmp/bun-lambda-dispatch.sock";

/// How long to wait before retrying a failed child spawn, and how many
/// times to retry before giving up and exiting (spec §7: a cold start that
/// cannot bind its dispatcher is the same class of fatal startup failure
/// as a missing interpreter, but is reported to the control plane first
/// in case it is transient).
const CHILD_SPAWN_RETRY_BACKOFF: std::time::Duration = std::time::Duration::from_millis(100);
const CHILD_SPAWN_MAX_ATTEMPTS: u32 = 3;

#[tokio::main]
async fn main() -> Result<(), Error> {
    bun_lambda_runtime_api_client::tracing::init_default_subscriber();

    let task_root = task_root();

    let interpreter_path = match env::verify_interpreter(&task_root) {
        Ok(path) => path,
        Err(message) => {
            eprintln!("bootstrap: {message}");
            std::process::exit(1);
        }
    };

    env::prepare();

    let dispatcher_source = task_root.join("runtime").join("index.js");
    let socket_path = PathBuf::from(SOCKET_PATH);

    let _child = spawn_child_with_retry(&interpreter_path, &dispatcher_source, &task_root, &socket_path).await;

    let socket_path: String = SOCKET_PATH.to_string();
    bun_lambda_http::run(service_fn(move |req| {
        let socket_path = socket_path.clone();
        async move { proxy::dispatch(req, &socket_path).await }
    }))
    .await
}

/// Spawns the dispatcher child, retrying a bounded number of times with a
/// fixed backoff and reporting each failure to `/init/error` (spec §4.4
/// Failure Semantics: "back off and retry"). Exits the process if the
/// child never comes up — a dispatcher that cannot bind its socket is not
/// a condition the event loop can recover from invocation-by-invocation.
async fn spawn_child_with_retry(
    interpreter_path: &Path,
    dispatcher_source: &Path,
    task_root: &Path,
    socket_path: &Path,
) -> tokio::process::Child {
    for attempt in 1..=CHILD_SPAWN_MAX_ATTEMPTS {
        match child::spawn(interpreter_path, dispatcher_source, task_root, socket_path).await {
            Ok(child) => return child,
            Err(err) => {
                tracing::error!(attempt, error = %err, "dispatcher child failed to start");
                bun_lambda_runtime::report_init_error(&err.to_string()).await;
                if attempt < CHILD_SPAWN_MAX_ATTEMPTS {
                    tokio::time::sleep(CHILD_SPAWN_RETRY_BACKOFF).await;
                }
            }
        }
    }
    eprintln!("bootstrap: dispatcher child did not start after {CHILD_SPAWN_MAX_ATTEMPTS} attempts");
    std::process::exit(1);
}

/// `LAMBDA_TASK_ROOT`, defaulting to `/var/task` (spec §6).
fn task_root() -> PathBuf {
    std::env::var("LAMBDA_TASK_ROOT").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("/var/task"))
}
