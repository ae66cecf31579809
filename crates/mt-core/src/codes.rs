//! Random ids and short catalog codes.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Length of generated active-session ids.
pub const ID_LENGTH: usize = 8;

/// Length of auto-generated catalog codes.
pub const CODE_LENGTH: usize = 4;

/// Returns `len` characters drawn uniformly from `[a-zA-Z0-9]`.
pub fn generate_random(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Returns an opaque id for an active session.
pub fn generate_id() -> String {
    generate_random(ID_LENGTH)
}

/// Derives a code from a name: its first four characters lowercased, or a
/// random four-character code when the name is too short.
///
/// Codes are not checked for uniqueness.
pub fn create_auto_code(name: &str) -> String {
    if name.chars().count() >= CODE_LENGTH {
        name.chars().take(CODE_LENGTH).collect::<String>().to_lowercase()
    } else {
        generate_random(CODE_LENGTH)
    }
}
