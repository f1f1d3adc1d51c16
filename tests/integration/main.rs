//! Integration tests

mod config_test;
mod governor_test;
mod replay_test;
