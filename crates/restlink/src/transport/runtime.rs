//! Runtime management for the blocking transport.
//!
//! `reqwest` is async; [`ReqwestTransport`](super::ReqwestTransport) drives it
//! on a process-wide tokio runtime so that connection calls can block.

use std::io;
use std::sync::OnceLock;

use tokio::runtime::Runtime;

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Get the shared runtime, creating it on first use.
pub fn get() -> io::Result<&'static Runtime> {
    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("restlink-io")
        .enable_all()
        .build()?;

    // Another thread may have won the race; its runtime is kept and ours dropped.
    Ok(RUNTIME.get_or_init(|| runtime))
}

/// Block on a future using the shared runtime.
///
/// # Warning
///
/// Do not call this from within an async context; tokio panics when a
/// runtime is blocked on from one of its own tasks.
pub fn block_on<F: std::future::Future>(future: F) -> io::Result<F::Output> {
    Ok(get()?.block_on(future))
}

/// Check if the current thread is running inside a tokio runtime.
pub fn in_async_context() -> bool {
    tokio::runtime::Handle::try_current().is_ok()
}
