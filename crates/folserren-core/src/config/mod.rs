//! Configuration management for folserren.
//!
//! Runner settings ([`settings::Config`]) are stored as TOML and list the
//! folders to monitor together with their naming template and order.

pub mod settings;
