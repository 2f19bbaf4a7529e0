//! Request handlers

pub mod accounts;
pub mod health;
pub mod movements;
pub mod statements;
