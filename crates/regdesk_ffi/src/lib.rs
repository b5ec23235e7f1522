//! FRB-facing bindings for the registration desk core.

pub mod api;
