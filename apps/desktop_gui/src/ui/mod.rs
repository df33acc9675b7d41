//! UI layer for the profile card: app shell and backend worker loop.

pub mod app;

pub use app::ProfileApp;
