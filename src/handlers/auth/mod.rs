// Declare handler modules - each file contains one route handler
pub mod login;    // POST /auth/login
pub mod register; // POST /auth/register
pub mod whoami;   // GET /auth/me

pub use login::login;
pub use register::register;
pub use whoami::whoami;
