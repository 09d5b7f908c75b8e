pub mod catalog;
pub mod config;
pub mod error;
pub mod firestore;
pub mod platform;
pub mod player;
pub mod progress;
pub mod view;
