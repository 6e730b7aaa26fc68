pub mod attendance;
pub mod employee;
pub mod schedule;
pub mod site;
