pub mod chat;
pub mod common;
pub mod completions;
pub mod config;
pub mod favorite;
pub mod plans;
pub mod wishlist;
