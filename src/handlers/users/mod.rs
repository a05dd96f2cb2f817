mod crud;
mod download;
mod multipart;
mod stats;

pub use crud::{create, delete, get, list, update};
pub use download::download;
pub use stats::stats;
