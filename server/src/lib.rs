//! Shared-arena server library.
//!
//! Windows registered by connected clients are merged into one boundary;
//! balls bounce inside it and every client sees the same frames. This module
//! exposes the server components for use in tests and binaries.

pub mod boundary;
pub mod collision;
pub mod config;
pub mod error;
pub mod game_loop;
pub mod geometry;
pub mod protocol;
pub mod registry;
pub mod state;
pub mod world;
pub mod ws;
