//! Types kept in the visitor's session.

mod session;

pub use session::keys as session_keys;
