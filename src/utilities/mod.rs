pub mod data_loader;
pub mod helpers;
pub mod spectrum;
