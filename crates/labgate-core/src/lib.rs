//! Core library for labgate.
//!
//! This crate provides the session-state machinery behind the labgate demo:
//! - `Directory`: a static credential directory (username -> role, display name)
//! - `SessionStore`: the single source of truth for "who is logged in",
//!   persisted across restarts through a pluggable key-value backend
//! - `StorageBackend`: the persistence seam, with file and in-memory backends
//!
//! The store deliberately holds plaintext demo credentials and does no
//! hashing; it models the session lifecycle, not real authentication.

pub mod directory;
pub mod error;
pub mod session;
pub mod storage;

pub use directory::{Directory, DirectoryEntry, Role};
pub use error::LoginError;
pub use session::{SessionData, SessionStore};
pub use storage::{FileBackend, MemoryBackend, StorageBackend};
