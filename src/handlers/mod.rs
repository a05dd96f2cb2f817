// Three handler groups: /api/auth/* for the dashboard operator session,
// /api/admins/* for operator account management, and /api/users/* for the
// managed records. Login is the only public endpoint; everything else sits
// behind the JWT middleware.
pub mod admins;
pub mod auth;
pub mod users;
