pub mod booking_code;
pub mod jwt;
pub mod mailer;
