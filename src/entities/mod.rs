pub mod inventory;
pub mod item;
