//! Routes diagnostics to either `log` or `defmt` and falls back to no-ops
//! when neither feature is enabled. Panic-family macros defer to `defmt`
//! when it is active so messages survive on embedded targets.

macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "log")]
        ::log::trace!($s $(, $x)*);
        #[cfg(feature = "defmt")]
        ::defmt::trace!($s $(, $x)*);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        let _ = ($( & $x ),*);
    }};
}

macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "log")]
        ::log::debug!($s $(, $x)*);
        #[cfg(feature = "defmt")]
        ::defmt::debug!($s $(, $x)*);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        let _ = ($( & $x ),*);
    }};
}

macro_rules! warning {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "log")]
        ::log::warn!($s $(, $x)*);
        #[cfg(feature = "defmt")]
        ::defmt::warn!($s $(, $x)*);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        let _ = ($( & $x ),*);
    }};
}

macro_rules! error {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "log")]
        ::log::error!($s $(, $x)*);
        #[cfg(feature = "defmt")]
        ::defmt::error!($s $(, $x)*);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        let _ = ($( & $x ),*);
    }};
}

macro_rules! unreachable {
    ($($x:tt)*) => {{
        #[cfg(not(feature = "defmt"))]
        ::core::unreachable!($($x)*);
        #[cfg(feature = "defmt")]
        ::defmt::unreachable!($($x)*);
    }};
}

macro_rules! debug_assert {
    ($($x:tt)*) => {{
        #[cfg(not(feature = "defmt"))]
        ::core::debug_assert!($($x)*);
        #[cfg(feature = "defmt")]
        ::defmt::debug_assert!($($x)*);
    }};
}

pub(crate) use {debug, debug_assert, error, trace, unreachable, warning as warn};
