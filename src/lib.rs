pub mod banner;
pub mod browser;
pub mod commands;
pub mod config;
pub mod consts;
pub mod data;
pub mod pages;
pub mod router;
pub mod worker;
