pub mod assets;
pub mod classify;
pub mod trends;
