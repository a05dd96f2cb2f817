pub mod admin;
pub mod user;

pub use admin::AdminRow;
pub use user::{Role, UserRow};
