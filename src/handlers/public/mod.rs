// handlers/public/mod.rs - Handlers reachable without an activated account
//
// Registration, activation, password reset and token issuance. Requests
// still pass through rate limiting and token resolution, but nothing here
// requires the caller to be authenticated.

pub mod healthcheck;
pub mod tokens;
pub mod users;

pub use healthcheck::healthcheck;
pub use tokens::{create_authentication_token, create_password_reset_token};
pub use users::{activate_user, register_user, update_user_password};
