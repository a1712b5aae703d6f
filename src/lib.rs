//! Discourse Mention Notifier library.
//!
//! A batch client that scans a Discourse forum's public post feed for
//! configured keywords and relays matching posts to a Telegram chat,
//! remembering the last processed post between runs.

pub mod checkpoint;
pub mod config;
pub mod discourse;
pub mod keywords;
pub mod runner;
pub mod telegram;
