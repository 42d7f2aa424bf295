pub mod conversation;
pub mod inbox;
pub mod member;
pub mod profile;
pub mod user;
