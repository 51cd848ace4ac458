// LSP protocol layer
// - server.rs: stdio bootstrap
// - backend.rs: LanguageServer trait implementation
// - dispatcher.rs: method table, lazy parsing, failure boundary
// - session.rs: workspace root and engine fixed at initialize
// - diagnostics.rs: engine offenses to published diagnostics

pub mod backend;
pub mod diagnostics;
pub mod dispatcher;
pub mod server;
pub mod session;
