pub mod config;
pub mod forecast;
pub mod indicators;
pub mod market;
pub mod models;
pub mod monitor;
pub mod strategies;
#[cfg(test)]
pub mod test_helpers;
pub mod trading;
