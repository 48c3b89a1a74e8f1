pub mod benchmark;
pub mod config;
pub mod hands;
pub mod runner;
pub mod util;
