use std::sync::LazyLock;

use regex::Regex;

static ACCOUNT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9\-.]{2,15}$").expect("valid account-name pattern"));

/// Whether `name` is a well-formed account name. Applied when a follow or
/// reblog references an account; account creation stores names as the
/// upstream presents them.
pub fn is_valid_account_name(name: &str) -> bool {
    ACCOUNT_NAME.is_match(name)
}
