pub mod user_service;

pub use user_service::{Download, UserError, UserInput, UserService};
