//! CLI Exit Code Registry
//!
//! Single source of truth for exit codes. They are part of the shell
//! contract; scripts depend on the exact values.
//!
//! | Range | Domain    | Description                               |
//! |-------|-----------|-------------------------------------------|
//! | 0     | Universal | Success                                   |
//! | 1     | Universal | General error (unspecified)               |
//! | 2     | Universal | CLI usage error (bad args, missing file)  |
//! | 50-59 | fetch     | Database export retrieval                 |
//! | 60-69 | get       | Remote reference lookup                   |

/// Success - command completed without errors. Per-row ingestion failures
/// do not change this: a finished run is a success.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Upstream retrieval failed (transport error or bad HTTP status).
pub const EXIT_FETCH_UPSTREAM: u8 = 50;

/// Export downloaded but failed the size sanity check.
pub const EXIT_FETCH_TRUNCATED: u8 = 51;

/// Reference not present in the published index.
pub const EXIT_GET_NOT_FOUND: u8 = 60;

/// Data repository unreachable or returned an error.
pub const EXIT_GET_UPSTREAM: u8 = 61;
