pub mod catalog;
pub mod config;
pub mod db;
pub mod filters;
pub mod import;
pub mod output;
