pub mod format;

pub use format::{user_view, AdminProfile, AdminView, FileUrlBuilder, StatsView, UserView};
