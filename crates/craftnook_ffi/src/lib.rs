//! Flutter bridge for the CraftNook core.

pub mod api;
