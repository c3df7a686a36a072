//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod clock;
mod repository;
mod scheduler;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use clock::{Clock, ManualClock, SystemClock};
pub use repository::{
    BaseRepository, CategoryRepository, PostMutation, PostRepository, UserRepository,
};
pub use scheduler::PublicationScheduler;
