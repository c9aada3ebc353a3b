pub mod config;
pub mod context;
pub mod handlers;
pub mod options;
pub mod project;
pub mod reply;
pub mod repl;
pub mod router;
pub mod tracker;
