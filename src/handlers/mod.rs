//! HTTP handlers for the admin diagnostic page

pub mod logout;
pub mod whoami;

pub use logout::logged_out;
pub use whoami::{whoami_index, whoami_source, DiagState};
