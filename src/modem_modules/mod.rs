pub mod config;
pub mod fields;
pub mod report;
pub mod session;
pub mod status;
