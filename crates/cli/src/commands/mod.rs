pub mod chat;
pub mod config_cmd;
pub mod filters;
pub mod serve;
