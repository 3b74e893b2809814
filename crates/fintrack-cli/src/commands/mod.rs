pub mod common;
pub mod jobs;
pub mod logout;
pub mod sync;
