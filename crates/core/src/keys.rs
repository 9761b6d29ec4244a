//! API key selection hook.
//!
//! A host may provide a [`KeySelector`] that knows whether the user picked an
//! API key and can open a picker. Without one, the key is assumed configured.

use crate::error::Result;

pub trait KeySelector {
    fn has_selected_key(&self) -> bool;

    /// Lets the user choose a key. Returns once the choice is made.
    fn open_key_selector(&mut self) -> Result<()>;
}

/// Resolves the key status shown at startup.
pub fn key_status(selector: Option<&dyn KeySelector>) -> bool {
    selector.is_none_or(|s| s.has_selected_key())
}
