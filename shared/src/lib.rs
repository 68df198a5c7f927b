//! Wire types shared between the arena server and its clients.

pub mod protocol;
pub mod vec2;
