pub mod inventory;
pub mod lifecycle;
pub mod slots;
