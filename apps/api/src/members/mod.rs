//! Family members and clients managed by an account holder.

pub mod handlers;
