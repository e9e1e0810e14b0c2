use validator::ValidateEmail;

pub const MAX_PLAN_NAME_LEN: usize = 20;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Usernames are 3-100 characters of ASCII letters, digits, `_`, `-` or `.`.
pub fn is_valid_username(username: &str) -> bool {
    (3..=100).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// Plan names are case-sensitive, 1-20 characters, no surrounding whitespace.
pub fn is_valid_plan_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().count() <= MAX_PLAN_NAME_LEN
        && name.trim() == name
}
