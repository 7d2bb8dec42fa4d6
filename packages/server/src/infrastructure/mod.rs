//! Infrastructure layer: concrete collaborators for the router.

pub mod connection;
pub mod dto;
pub mod store;
