// Process exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
/// The run completed but device output differs from the host reference.
pub const EXIT_VERIFICATION_FAILED: i32 = 2;
