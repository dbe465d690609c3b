//! Core infrastructure module for pdtree-rust.
//!
//! - [`types`]: index aliases and shared enumerations
//! - [`constants`]: configuration defaults
//! - [`error`]: the crate error type and helpers

pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::{AggregateError, PdtError, Result};
pub use types::*;

use std::sync::atomic::{AtomicBool, Ordering};

static CORE_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize logging for the library.
///
/// Safe to call more than once; an already installed logger is kept.
pub fn initialize_core() -> Result<()> {
    if CORE_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    // Try to initialize env_logger, ignore if already initialized
    let _ = env_logger::try_init();
    log::debug!("pdtree-rust {} initialized", PDTREE_RUST_VERSION);
    Ok(())
}

/// Check if the core module has been initialized.
pub fn is_core_initialized() -> bool {
    CORE_INITIALIZED.load(Ordering::SeqCst)
}
