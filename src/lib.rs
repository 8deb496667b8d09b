pub mod actions;
pub mod aggregate;
pub mod config;
pub mod error;
pub mod exclude;
pub mod gate;
pub mod github;
pub mod model;
pub mod parsers;
pub mod report;
pub mod threshold;
