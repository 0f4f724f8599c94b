//! CLI Exit Code Registry
//!
//! Single source of truth for exit codes. Exit codes are part of the shell
//! contract — scripts and cron jobs rely on them.
//!
//! | Range | Domain    | Description                              |
//! |-------|-----------|------------------------------------------|
//! | 0     | Universal | Success                                  |
//! | 1     | Universal | General error (unspecified)              |
//! | 2     | Universal | CLI usage error (bad args, missing file) |
//! | 3-9   | import    | Import run codes                         |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Profile failed to parse or validate.
pub const EXIT_IMPORT_INVALID_PROFILE: u8 = 3;

/// Runtime failure (unreadable input, store error, serialization).
pub const EXIT_IMPORT_RUNTIME: u8 = 4;

/// Run completed but produced conflicts that need review.
pub const EXIT_IMPORT_CONFLICTS: u8 = 5;

/// Run completed but some rows errored.
pub const EXIT_IMPORT_ROW_ERRORS: u8 = 6;
