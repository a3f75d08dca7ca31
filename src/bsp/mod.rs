pub mod entities;
pub mod level;
pub mod loader;
pub mod raw;

#[cfg(test)]
pub mod fixture;

pub use entities::{Entity, parse_entities};
pub use level::RawLevel;
pub use loader::{LoadError, load_level, load_level_file};
pub use raw::{BspError, BspFile, Lump};
