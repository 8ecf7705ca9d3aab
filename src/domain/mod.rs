pub mod user;
pub mod post;
pub mod vote;
pub mod winner;

pub use user::*;
pub use post::*;
pub use vote::*;
pub use winner::*;
