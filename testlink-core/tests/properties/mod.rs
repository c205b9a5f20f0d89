//! Property test modules

mod cdata_tests;
mod statistics_tests;
mod strategy_tests;
