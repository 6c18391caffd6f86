//! Room invite code generation.

use rand::Rng;

/// Length of a generated invite code.
pub const INVITE_CODE_LENGTH: usize = 8;

/// Generate a random alphanumeric invite code, uppercased for easy
/// reading aloud between roommates.
pub fn generate_invite_code() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(INVITE_CODE_LENGTH)
        .map(char::from)
        .collect::<String>()
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_has_expected_length_and_charset() {
        let code = generate_invite_code();
        assert_eq!(code.len(), INVITE_CODE_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(!code.chars().any(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn codes_are_not_constant() {
        let a = generate_invite_code();
        let b = generate_invite_code();
        let c = generate_invite_code();
        assert!(a != b || b != c);
    }
}
