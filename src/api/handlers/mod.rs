pub mod availability;
pub mod booking;
pub mod client;
pub mod content;
pub mod health;
pub mod package;
