//! Diagnostic macros
//!
//! `val_dbg!` reports why a post was rejected, with the offending values.
//! It is compiled to a no-op unless the `debug-validate` feature is on, but
//! its arguments are still type-checked in every configuration.

macro_rules! val_dbg {
    ($dev:expr, $($arg:tt)*) => {
        if cfg!(feature = "debug-validate") {
            log::debug!("{}: {}", $dev, format_args!($($arg)*));
        }
    };
}
