//! Filesystem I/O for the ward: scaffolding, config and the persisted document.

pub mod config;
pub mod init;
pub mod store;
