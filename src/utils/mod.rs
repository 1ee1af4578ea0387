pub mod executor;
pub mod paths;
pub mod prompt;
