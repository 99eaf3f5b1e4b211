pub mod auth;

pub mod interface;

#[allow(clippy::module_inception)]
pub mod session;
