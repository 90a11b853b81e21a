//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// System prompt for plan generation
pub const DIAGNOSE_SYSTEM: &str = include_str!("../../prompts/diagnose-system.pmt");

/// User prompt carrying symptoms and pool context
pub const DIAGNOSE_USER: &str = include_str!("../../prompts/diagnose-user.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "diagnose-system" => {
            debug!("get_embedded: matched diagnose-system");
            Some(DIAGNOSE_SYSTEM)
        }
        "diagnose-user" => {
            debug!("get_embedded: matched diagnose-user");
            Some(DIAGNOSE_USER)
        }
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
