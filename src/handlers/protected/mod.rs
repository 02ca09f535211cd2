// handlers/protected/mod.rs - Handlers behind the activated-account gate
//
// Routes mount these with `require_activated_user`; book routes add a
// permission gate on top. Ownership checks happen inside the handlers.

pub mod books;
pub mod comments;
pub mod reading_lists;
pub mod reviews;
pub mod users;
