//! Foundational types shared by every other module.

pub mod config;
pub mod error;
pub mod instrument;
pub mod opportunity;
pub mod response;
pub mod result;
