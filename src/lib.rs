//! Personal portfolio site with a background music player and a small
//! visitor tracker.

pub mod audio;
pub mod components;
pub mod config;
pub mod db;
pub mod tracker;
