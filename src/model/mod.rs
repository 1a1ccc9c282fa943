pub mod api;
pub mod auth;
pub mod ballot;
pub mod common;
pub mod db;
pub mod mongodb;
