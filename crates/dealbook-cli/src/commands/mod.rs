//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `export` - Sheet export, preview and webhook push
//! - `reports` - Dashboard sections and the full dashboard
//! - `serve` - Web server command

pub mod export;
pub mod reports;
pub mod serve;

// Re-export command functions for main.rs
pub use export::*;
pub use reports::*;
pub use serve::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
