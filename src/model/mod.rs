pub mod data_core;
pub mod host;
pub mod moment;
pub mod settings;
pub mod slot;
