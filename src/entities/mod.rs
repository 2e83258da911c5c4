pub mod notification_log;
pub mod ticket;
pub mod trip;
pub mod user;
