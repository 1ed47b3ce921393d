pub mod command;
pub mod json_file;

pub use command::{CommandConfig, CommandDataset};
pub use json_file::JsonFileDataset;
