pub mod config;
pub mod sandbox;
pub mod script;
