//! Global session state.

use std::sync::{OnceLock, RwLock};

use labelscope_core::{LabelscopeError, Result};

use crate::config::SessionConfig;
use crate::session::Session;

/// Global context singleton.
static CONTEXT: OnceLock<RwLock<Context>> = OnceLock::new();

/// The global context holding the process-wide session.
pub struct Context {
    /// Whether labelscope has been initialized.
    pub initialized: bool,

    pub session: Session,
}

/// Initializes the global context.
///
/// This should be called once at the start of the program.
pub fn init_context(config: SessionConfig) -> Result<()> {
    let session = Session::new(config)?;
    CONTEXT
        .set(RwLock::new(Context {
            initialized: true,
            session,
        }))
        .map_err(|_| LabelscopeError::AlreadyInitialized)
}

/// Returns whether the context has been initialized.
pub fn is_initialized() -> bool {
    CONTEXT
        .get()
        .and_then(|lock| lock.read().ok())
        .is_some_and(|ctx| ctx.initialized)
}

/// Access the global session for reading.
///
/// # Panics
///
/// Panics if labelscope has not been initialized.
pub fn with_session<F, R>(f: F) -> R
where
    F: FnOnce(&Session) -> R,
{
    let lock = CONTEXT.get().expect("labelscope not initialized");
    let guard = lock.read().expect("context lock poisoned");
    f(&guard.session)
}

/// Access the global session for writing.
///
/// # Panics
///
/// Panics if labelscope has not been initialized.
pub fn with_session_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut Session) -> R,
{
    let lock = CONTEXT.get().expect("labelscope not initialized");
    let mut guard = lock.write().expect("context lock poisoned");
    f(&mut guard.session)
}

/// Try to access the global session for reading.
///
/// Returns `None` if labelscope has not been initialized.
pub fn try_with_session<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&Session) -> R,
{
    let lock = CONTEXT.get()?;
    let guard = lock.read().ok()?;
    guard.initialized.then(|| f(&guard.session))
}

/// Try to access the global session for writing.
///
/// Returns `None` if labelscope has not been initialized.
pub fn try_with_session_mut<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut Session) -> R,
{
    let lock = CONTEXT.get()?;
    let mut guard = lock.write().ok()?;
    if !guard.initialized {
        return None;
    }
    Some(f(&mut guard.session))
}

/// Runs `f` on the session, failing with [`LabelscopeError::NotInitialized`]
/// instead of panicking.
pub(crate) fn session_mut<F, R>(f: F) -> Result<R>
where
    F: FnOnce(&mut Session) -> Result<R>,
{
    try_with_session_mut(f).ok_or(LabelscopeError::NotInitialized)?
}

/// Shuts down the global context.
///
/// Note: Due to `OnceLock` semantics, the context cannot be re-initialized
/// after shutdown in the same process.
pub fn shutdown_context() {
    if let Some(lock) = CONTEXT.get() {
        if let Ok(mut ctx) = lock.write() {
            ctx.initialized = false;
            ctx.session.edit_store(labelscope_core::AnnotationStore::clear);
        }
    }
}
