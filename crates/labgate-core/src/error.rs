use thiserror::Error;

/// Failure surfaced to callers of `SessionStore::login`.
///
/// Unknown usernames and wrong passwords are deliberately collapsed into a
/// single variant so callers cannot tell which half of the credential pair
/// was wrong. Storage and parse failures never appear here; the store
/// degrades to the anonymous state and logs a diagnostic instead.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginError {
    #[error("Invalid username or password")]
    InvalidCredentials,
}
