pub mod session;

pub use session::{close, open, resolve_user, ConsoleSession};
