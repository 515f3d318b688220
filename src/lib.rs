//! Client-side ordering and synchronization engine for a collaborative
//! kanban board, plus the SQLite storage and change-feed service it syncs
//! against.

pub mod api;
pub mod board;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ordering;
pub mod ports;
pub mod services;
