//! Listing backends
//!
//! Contains CommandListing, LocalListing, InMemoryListing and the
//! config-selected ListingBackend.

mod backend;
mod command;
mod local;
mod memory;

pub use self::backend::ListingBackend;
pub use self::command::CommandListing;
pub use self::local::LocalListing;
pub use self::memory::InMemoryListing;

/// Split raw listing output into trimmed, non-empty lines
pub(crate) fn parse_lines(raw: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(raw)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines_skips_blank_and_trims() {
        let raw = b"/out/a\r\n\n  /out/b  \n";
        assert_eq!(parse_lines(raw), vec!["/out/a", "/out/b"]);
    }
}
