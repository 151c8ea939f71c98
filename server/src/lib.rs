//! Campus Hub Server
//!
//! Community backend for a university: forums, shared resources, events with
//! RSVP, organizer requests and role-based moderation.

pub mod admin;
pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod events;
pub mod forum;
pub mod organizer;
pub mod permissions;
pub mod resources;
pub mod users;
