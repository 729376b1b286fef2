#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Toolsets for the tandem workflow runtime.
//!
//! A [`Toolset`] is a named container of [`Tool`]s with an optional
//! lifecycle (`cleanup`) and approval metadata. Toolsets are *per call*:
//! the factory registry instantiates a fresh set for every call scope, and
//! the scope cleans them up in reverse order when it closes. No instance is
//! ever shared between scopes.

mod attachment;
mod error;
mod fs;
mod registry;
mod shell;
mod toolset;

pub use attachment::{attachment_media_type, AttachmentToolset, READ_ATTACHMENT_TOOL};
pub use error::{ToolError, ToolResult};
pub use fs::FsToolset;
pub use registry::{ToolsetFactory, ToolsetInit, ToolsetRegistry};
pub use shell::ShellToolset;
pub use toolset::{Tool, Toolset, ToolsetSpec};

/// Maximum tool output size in characters before truncation.
const MAX_OUTPUT_CHARS: usize = 30_000;

/// Truncate tool output to stay within model context limits.
#[must_use]
pub fn truncate_output(output: String) -> String {
    if output.len() <= MAX_OUTPUT_CHARS {
        return output;
    }
    let mut cut = MAX_OUTPUT_CHARS;
    while cut > 0 && !output.is_char_boundary(cut) {
        cut = cut.saturating_sub(1);
    }
    let mut truncated = output[..cut].to_string();
    truncated.push_str("\n\n... (output truncated — exceeded 30000 character limit)");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_output_small() {
        let small = "hello".to_string();
        assert_eq!(truncate_output(small.clone()), small);
    }

    #[test]
    fn test_truncate_output_large() {
        let large = "x".repeat(40_000);
        let result = truncate_output(large);
        assert!(result.len() < 40_000);
        assert!(result.contains("output truncated"));
    }
}
