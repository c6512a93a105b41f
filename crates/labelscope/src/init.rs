//! Initialization and lifecycle management for labelscope.

use labelscope_core::Result;

use crate::config::SessionConfig;

/// Initializes labelscope with a session configuration.
///
/// This must be called before any other labelscope functions. It also
/// installs `env_logger` unless the host already set up a logger.
///
/// # Errors
///
/// Returns an error if labelscope has already been initialized or the
/// configuration is invalid.
///
/// # Example
///
/// ```no_run
/// use labelscope::*;
///
/// fn main() -> Result<()> {
///     init(SessionConfig::default())?;
///     Ok(())
/// }
/// ```
pub fn init(config: SessionConfig) -> Result<()> {
    let _ = env_logger::try_init();
    crate::state::init_context(config)?;
    log::info!("labelscope initialized");
    Ok(())
}

/// Initializes labelscope with a configuration file.
pub fn init_from_path(path: impl AsRef<std::path::Path>) -> Result<()> {
    init(SessionConfig::from_path(path)?)
}

/// Returns whether labelscope has been initialized.
#[must_use]
pub fn is_initialized() -> bool {
    crate::state::is_initialized()
}

/// Shuts down labelscope and discards all annotations.
///
/// Note: This is typically not needed as resources are cleaned up when the
/// program exits. It's mainly useful for tests.
pub fn shutdown() {
    crate::state::shutdown_context();
    log::info!("labelscope shut down");
}
