mod file_config;

pub use file_config::FileConfig;
