pub mod config;
pub mod crosstab;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod model;
pub mod output;
pub mod parser;
