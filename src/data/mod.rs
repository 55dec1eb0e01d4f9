pub mod credentials;
pub mod memory;
