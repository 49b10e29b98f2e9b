#![allow(unused_macros)]

//! Logging shims. With the `logging` feature the calls go to the `log` crate,
//! without it the arguments are only borrowed and discarded.

macro_rules! debug {
    ($($arg:tt)+) => {
        #[cfg(feature = "logging")]
        log::debug!(target: "compartment", $($arg)+);
        #[cfg(not(feature = "logging"))]
        let _ = format_args!($($arg)+);
    };
}

macro_rules! trace {
    ($($arg:tt)+) => {
        #[cfg(feature = "logging")]
        log::trace!(target: "compartment", $($arg)+);
        #[cfg(not(feature = "logging"))]
        let _ = format_args!($($arg)+);
    };
}
