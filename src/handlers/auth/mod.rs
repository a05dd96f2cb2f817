mod login;
mod session;

pub use login::login;
pub use session::{change_password, logout, me};
