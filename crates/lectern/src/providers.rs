pub mod azure;
pub mod base;
pub mod configs;
pub mod mock;
pub mod utils;
