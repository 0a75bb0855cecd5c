use thiserror::Error;

macro_rules! invariant {
    ($msg:literal $(, $args:expr)* ) => {{
        return Err($crate::stdx::error::InternalInvariant::from( format!($msg $(, $args)*)).into());
    }};
    ($cond:expr, $msg:literal $(, $args:expr)* ) => {{
        if !$cond {
        return Err($crate::stdx::error::InternalInvariant::from( format!("`{}`, {}", stringify!($cond), format!($msg $(, $args)*))).into());
        }
    }};
}

pub(crate) use invariant;

/// Represents internal invariants that were violated.
///
/// If this is returned, the upstream service changed something the library
/// depends on, or the library itself has a bug.
///
/// # Use
///
/// Only used for assumptions about what the upstream service serves (markup,
/// script layout, payload shapes), never for input passed to the library.
#[derive(Debug, Error)]
#[error("internal invariant violated: {0}")]
pub struct InternalInvariant(String);

impl From<String> for InternalInvariant {
    #[inline]
    fn from(msg: String) -> Self {
        Self(msg)
    }
}

pub trait Invariant<T> {
    type Output;

    fn invariant(self, msg: impl Into<String>) -> Self::Output;
}

impl<T> Invariant<T> for Option<T> {
    type Output = Result<T, InternalInvariant>;

    #[inline]
    fn invariant(self, msg: impl Into<String>) -> Self::Output {
        self.ok_or_else(|| InternalInvariant(msg.into()))
    }
}

impl<T, E> Invariant<T> for Result<T, E> {
    type Output = Result<T, InternalInvariant>;

    #[inline]
    fn invariant(self, msg: impl Into<String>) -> Self::Output {
        self.map_err(|_err: _| InternalInvariant(msg.into()))
    }
}
