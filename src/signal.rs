//! Signal handling for graceful shutdown.
//!
//! A [`ShutdownHandler`] wraps a shared `AtomicBool`. Ctrl+C raises it, and
//! so can any code holding a clone of the handler. The one-shot phases check
//! it between files; the watch loop checks it on every tick and returns when
//! it is raised. Tests use [`create_handler`] to get a handler with no OS
//! hook attached and stop a watch session with [`ShutdownHandler::request_shutdown`].
//!
//! ```rust,no_run
//! use linesweep::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! if handler.is_shutdown_requested() {
//!     return;
//! }
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (Ctrl+C) interruption: 128 + SIGINT.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared cancellation flag.
#[derive(Debug, Clone)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// `true` once Ctrl+C was pressed or `request_shutdown()` was called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Raise the flag.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the underlying flag for code that only needs the atomic.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Lower the flag again.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install a Ctrl+C handler that raises the shutdown flag.
///
/// Only one OS hook can exist per process. Later calls (tests running
/// `run_app` in parallel, for instance) get the already-installed handler
/// back with its flag reset, or an unhooked handler if some other code
/// owns the hook.
///
/// # Errors
///
/// Currently always succeeds; the `Result` leaves room for platforms where
/// a missing hook should be fatal.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    Ok(register_once(&GLOBAL_HANDLER, |flag| {
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);

            let _ = writeln!(std::io::stderr(), "\nInterrupted. Stopping...");
            let _ = std::io::stderr().flush();

            log::info!("Shutdown signal received");
        })
    }))
}

/// Hand out the handler stored in `slot`, hooking a new one up with `hook`
/// the first time.
fn register_once<H>(slot: &OnceLock<ShutdownHandler>, hook: H) -> ShutdownHandler
where
    H: FnOnce(Arc<AtomicBool>) -> Result<(), ctrlc::Error>,
{
    if let Some(handler) = slot.get() {
        handler.reset();
        return handler.clone();
    }

    let handler = ShutdownHandler::new();
    match hook(handler.get_flag()) {
        Ok(()) => {}
        Err(e) => log::debug!("Ctrl+C hook not installed ({}), using unhooked handler", e),
    }

    // A racing caller may have filled the slot first; everyone shares its handler.
    let shared = slot.get_or_init(|| handler);
    shared.reset();
    shared.clone()
}

/// Create a handler without installing any signal hooks.
#[must_use]
pub fn create_handler() -> ShutdownHandler {
    ShutdownHandler::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_handler_new() {
        let handler = ShutdownHandler::new();
        assert!(!handler.is_shutdown_requested());
    }

    #[test]
    fn test_request_and_reset() {
        let handler = ShutdownHandler::default();
        handler.request_shutdown();
        assert!(handler.is_shutdown_requested());

        handler.reset();
        assert!(!handler.is_shutdown_requested());
    }

    #[test]
    fn test_clone_shares_flag() {
        let handler = create_handler();
        let cloned = handler.clone();
        let flag = handler.get_flag();

        cloned.request_shutdown();
        assert!(handler.is_shutdown_requested());
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_shutdown_from_other_thread() {
        let handler = create_handler();
        let remote = handler.clone();

        std::thread::spawn(move || remote.request_shutdown())
            .join()
            .unwrap();

        assert!(handler.is_shutdown_requested());
    }

    #[test]
    fn test_exit_code_interrupted() {
        assert_eq!(EXIT_CODE_INTERRUPTED, 130);
    }

    #[test]
    fn test_register_once_reuses_hooked_handler() {
        let slot = OnceLock::new();
        let mut hooks = 0;

        let first = register_once(&slot, |_| {
            hooks += 1;
            Ok(())
        });
        first.request_shutdown();

        let second = register_once(&slot, |_| unreachable!("hook installed twice"));
        assert_eq!(hooks, 1);
        assert!(!second.is_shutdown_requested());

        second.request_shutdown();
        assert!(first.is_shutdown_requested());
    }

    #[test]
    fn test_register_once_falls_back_when_hook_taken() {
        let slot = OnceLock::new();

        let handler = register_once(&slot, |_| Err(ctrlc::Error::MultipleHandlers));
        assert!(!handler.is_shutdown_requested());

        // The unhooked handler is still stored and shared with later callers.
        let again = register_once(&slot, |_| Ok(()));
        handler.request_shutdown();
        assert!(again.is_shutdown_requested());
    }

    #[test]
    fn test_install_handler_twice_shares_flag() {
        let first = install_handler().unwrap();
        let second = install_handler().unwrap();
        assert!(Arc::ptr_eq(&first.flag, &second.flag));
    }

    #[test]
    fn test_shutdown_handler_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ShutdownHandler>();
    }
}
