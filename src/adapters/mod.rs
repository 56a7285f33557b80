pub mod memory;
pub mod push;
