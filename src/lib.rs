pub mod app;
pub mod cli;
pub mod config;
pub mod output;
pub mod pager;
pub mod parse;
pub mod render;
pub mod runner;
pub mod schema;
pub mod search;
pub mod utils;

#[cfg(test)]
mod tests;
