//! Post Validation
//!
//! # Components
//! - `sanity` - per-buffer well-formedness gate for composition drivers
//! - `simple` - the single full-screen buffer policy and its driver
//! - `request` - the validation control operation: marshals untrusted
//!   caller memory into a post and runs the driver's `validate` on it
//!
//! # Current Control Codes
//! - `VALIDATE_CONFIG_EXT` - canonical request layout
//! - `VALIDATE_CONFIG_EXT32` - 32-bit request layout (`compat` feature)

mod request;
mod sanity;
mod simple;

pub use request::{handle_validate_request, ioctl, ioctl_validate};
#[cfg(feature = "compat")]
pub use request::ioctl_validate_compat;
pub use sanity::buffer_sanity_check;
pub use simple::{validate_simple_post, SimpleDriver};
