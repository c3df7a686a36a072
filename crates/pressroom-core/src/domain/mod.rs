//! Domain entities - the core business objects.

mod category;
pub mod lifecycle;
mod post;
pub mod reactions;
mod user;

pub use category::Category;
pub use lifecycle::PublicationState;
pub use post::{Comment, DraftChanges, NewPost, Post, PostChanges, PostFilter, PostStatus};
pub use reactions::Reactions;
pub use user::User;
