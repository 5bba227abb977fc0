//! Editor buffer and the adapter the session core talks to.
//!
//! The session manager never touches the buffer directly: it only sees an
//! [`EditorAdapter`] with get/set content and a read-only switch.

mod adapter;
mod buffer;

pub use adapter::{EditorAdapter, SharedBuffer};
pub use buffer::{Cursor, Direction, EditorBuffer};
