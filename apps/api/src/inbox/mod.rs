//! Practitioner inboxes: members write to a practitioner, practitioners read
//! and mark messages as read.

pub mod handlers;
