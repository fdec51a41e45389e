pub mod project;
pub mod review;
pub mod task;

pub use project::ProjectCommands;
pub use review::{ReviewCommands, ReviewEditArgs};
pub use task::TaskCommands;
