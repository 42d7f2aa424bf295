//! Account overview for the signed-in caller. Sessions are issued elsewhere.

pub mod handlers;
