//! Shared state: the session store and the handler sets it is built on.

pub mod session;
pub mod subscription;
