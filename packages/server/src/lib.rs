//! Real-time chat live connection hub.
//!
//! Keeps one actor per authenticated device connection, tracks presence, and
//! fans out chat events to the online members of each chat.

// layers
pub mod domain;
pub mod hub;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

#[cfg(test)]
pub(crate) mod test_support;
