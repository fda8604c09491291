pub mod admin;
pub mod auth;
pub mod booking;
pub mod route;
pub mod schedule;
pub mod ws;
