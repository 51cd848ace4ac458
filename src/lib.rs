pub mod config;
pub mod document;
pub mod engine;
pub mod handlers;
pub mod log;
pub mod lsp;
pub mod position;
pub mod symbols;
