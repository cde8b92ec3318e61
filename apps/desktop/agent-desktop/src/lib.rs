// Library exports for testing
// The binary (main.rs) imports these as well

pub mod app_dirs;
pub mod backend;
pub mod error;
pub mod files;
pub mod host;
pub mod logger;
pub mod platform;
pub mod state;

#[cfg(test)]
mod tests;
