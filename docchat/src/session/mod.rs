//! Session token storage.

mod store;

pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
