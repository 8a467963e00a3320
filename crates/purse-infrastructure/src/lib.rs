pub mod paths;
pub mod sandbox;
pub mod toml_config_repository;

pub use crate::paths::PursePaths;
pub use crate::sandbox::{SandboxBackend, SandboxFixture};
pub use crate::toml_config_repository::TomlConfigRepository;
