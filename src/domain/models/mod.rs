pub mod availability;
pub mod booking;
pub mod client;
pub mod package;
pub mod site_content;
