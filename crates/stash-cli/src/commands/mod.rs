pub mod activity;
pub mod ask;
pub mod capture;
pub mod dispatch;
pub mod inbox;
pub mod process;
pub mod project;
pub mod review;
pub mod schema;
pub mod shared;
pub mod task;
pub mod watch;
