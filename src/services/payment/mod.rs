pub mod interface;
pub mod mock;
