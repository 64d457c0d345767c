pub mod config;
pub mod debug;
pub mod drive;
pub mod link;
pub mod pilot;
