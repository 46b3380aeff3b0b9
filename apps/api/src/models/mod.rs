pub mod cv;
pub mod subscription;
pub mod user;
