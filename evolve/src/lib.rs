pub mod config;
pub mod evolution;
pub mod network;
pub mod util;
