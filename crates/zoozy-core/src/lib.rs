pub mod config;
pub mod db;
pub mod http;
pub mod logging;
pub mod mail;
pub mod metrics;
pub mod migrations;
pub mod password;
pub mod server;
pub mod time;
pub mod token;
