mod walker;

pub use walker::Walker;
