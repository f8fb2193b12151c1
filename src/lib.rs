pub mod app;
pub mod config;
pub mod domain;
pub mod edirect;
pub mod error;
pub mod lineage;
pub mod output;
pub mod table;
