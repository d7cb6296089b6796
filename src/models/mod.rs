pub mod principal;
pub mod directory;
