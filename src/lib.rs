pub mod aws;
pub mod browser;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod idp;
pub mod refresh;
pub mod saml;
pub mod session;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
