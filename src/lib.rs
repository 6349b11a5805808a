pub mod config;
pub mod credentials;
pub mod fetch;
pub mod history;
pub mod logging;
pub mod output;
pub mod scoring;
pub mod sheets;
pub mod stderr_buffer;
pub mod tui;
