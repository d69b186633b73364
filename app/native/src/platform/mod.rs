//! Platform collaborators.
//!
//! - [`desktop`] - Desktop background and file opener
//! - [`path`] - Tilde expansion for configured paths
//! - [`thread`] - Named background threads

pub mod desktop;
pub mod path;
pub mod thread;

pub use desktop::{Desktop, DesktopError, SystemDesktop};
pub use thread::spawn_named_thread;
