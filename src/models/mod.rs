pub mod user;
pub mod job;
pub mod offering;
pub mod rating;

pub use user::*;
pub use job::*;
pub use offering::*;
pub use rating::*;
