pub mod booking;
pub mod bus;
pub mod route;
pub mod schedule;
pub mod user;
