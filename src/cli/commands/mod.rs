pub mod db;
pub mod hestia;
pub mod packages;
pub mod provision;
