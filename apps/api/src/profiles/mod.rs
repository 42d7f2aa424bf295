//! Health profiles of account holders and their members.
//! Updates go through an allow-list; see `models::profile::UPDATABLE_FIELDS`.

pub mod handlers;
