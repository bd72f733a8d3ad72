pub mod cv;
pub mod session;
