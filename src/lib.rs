pub mod config;
pub mod i18n;
pub mod resolve;
pub mod retry;
pub mod server;
pub mod slug;
pub mod store;
