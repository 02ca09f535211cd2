pub mod auth;
pub mod rate_limit;
pub mod recover;
pub mod response;
pub mod validate_user;

pub use auth::authenticate;
pub use rate_limit::{rate_limit, Clock, RateLimiter, SystemClock};
pub use recover::handle_panic;
pub use response::{method_not_allowed, ApiResponse, ApiResult};
pub use validate_user::{require_activated_user, require_permission, PermissionGate};
