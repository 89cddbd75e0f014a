pub mod manager;
pub mod profiles;

pub use manager::{DatabaseError, DatabaseManager};
pub use profiles::PgProfileBackend;
