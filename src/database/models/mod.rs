pub mod book;
pub mod comment;
pub mod permission;
pub mod reading_list;
pub mod review;
pub mod token;
pub mod user;

pub use book::{Book, BookPatch, NewBook};
pub use comment::{Comment, CommentPatch, NewComment};
pub use permission::Permissions;
pub use reading_list::{ListEntry, NewListEntry, NewReadingList, ReadingList, ReadingListPatch};
pub use review::{NewReview, Review, ReviewPatch};
pub use token::{Scope, Token};
pub use user::User;
