//! Tsunagi: a real-time message router.
//!
//! Tracks connected clients, groups them into rooms, and routes each inbound
//! message by kind to one client, a room, or everyone. Slow receivers are
//! disconnected instead of slowing the router down, and dead connections are
//! detected with a ping/pong heartbeat.
//!
//! - `domain`: message model, identities, rooms and collaborator traits
//! - `router`: connection manager, sessions and heartbeat
//! - `infrastructure`: JSON codec, connection adapters, in-memory store
//! - `ui`: axum server and admin API

pub mod domain;
pub mod infrastructure;
pub mod router;
pub mod ui;
