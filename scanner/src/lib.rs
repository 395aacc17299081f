pub mod blockchain;
pub mod checkpoint;
pub mod error;
pub mod sink;
