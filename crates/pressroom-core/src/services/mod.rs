//! Application services - run the gate, the state machine and the ports
//! in the right order for each operation.

mod categories;
mod posts;

pub use categories::CategoryService;
pub use posts::PostService;
