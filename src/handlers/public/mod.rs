// handlers/public/mod.rs - Public handlers (no authentication)

pub mod service;

pub use service::{health, root};
