//! Request and response bodies

pub mod account;
pub mod movement;
pub mod statement;
