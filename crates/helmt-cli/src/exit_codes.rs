//! Exit codes for helmt
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - helm failed, output could not be moved, ...
pub const ERROR: i32 = 1;

/// Validation error - a required descriptor field is missing
pub const VALIDATION_ERROR: i32 = 2;

/// Template error - `helm template` failed
pub const TEMPLATE_ERROR: i32 = 3;

/// Descriptor error - the descriptor is not valid YAML
pub const DESCRIPTOR_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
