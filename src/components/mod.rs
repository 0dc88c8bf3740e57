//! The components module contains all shared components for our app.

mod app;
mod app_view;
mod audio_controls;
mod audio_provider;
mod icons;
pub mod views;

pub use app::*;
pub use app_view::*;
pub use audio_controls::*;
pub use audio_provider::*;
pub use icons::*;
