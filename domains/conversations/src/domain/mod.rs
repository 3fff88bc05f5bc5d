//! Domain layer for Conversations

pub mod entities;
pub mod state;
