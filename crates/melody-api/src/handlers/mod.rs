pub mod download;
pub mod root;
