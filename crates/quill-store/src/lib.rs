pub mod session;
pub mod store;

pub use session::{count_chars, Session, DEFAULT_WORD_LIMIT};
pub use store::{start_eviction_task, CreatedSession, SessionHandle, SessionStore};
