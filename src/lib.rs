//! A runtime resource registry for UI components.
//!

pub use skein_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use skein_internal::prelude::*;
}
