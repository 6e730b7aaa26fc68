pub mod attendance;
pub mod reply;
