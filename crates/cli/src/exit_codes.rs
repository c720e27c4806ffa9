//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 10-19   | wiki             | Wiki API auth/network codes              |
//! | 20-29   | sync             | Sync driver codes                        |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Wiki (10-19)
// =============================================================================

/// Not authenticated (no saved credentials).
pub const EXIT_WIKI_NOT_AUTH: u8 = 10;

/// Credentials rejected by the identity endpoint.
pub const EXIT_WIKI_AUTH: u8 = 11;

/// Network/HTTP error communicating with the wiki service.
pub const EXIT_WIKI_NETWORK: u8 = 12;

/// Application-level rejection (non-zero code in a 200 response).
pub const EXIT_WIKI_REMOTE: u8 = 13;

// =============================================================================
// Sync (20-29)
// =============================================================================

/// At least one file failed to sync (others may have succeeded).
pub const EXIT_SYNC_PARTIAL: u8 = 20;
