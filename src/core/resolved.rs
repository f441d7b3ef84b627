//! Values that may have been substituted by a documented default.
//!
//! Configuration problems (an out-of-range quorum percentage, an unknown
//! trust event kind) are recovered locally, but the caller must be able to
//! tell that a fallback happened without parsing log output.

use serde::{Deserialize, Serialize};

/// Outcome of an operation that can fall back to a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Resolved<T> {
    /// The caller's input was used as given.
    Applied(T),
    /// The caller's input was replaced by a documented default.
    Defaulted { value: T, reason: String },
}

impl<T> Resolved<T> {
    /// Build a defaulted value and emit the warning that makes it observable.
    pub fn defaulted(value: T, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::warn!(%reason, "configuration fallback applied");
        Resolved::Defaulted { value, reason }
    }

    /// Borrow the resolved value.
    pub fn value(&self) -> &T {
        match self {
            Resolved::Applied(v) => v,
            Resolved::Defaulted { value, .. } => value,
        }
    }

    /// Take the resolved value.
    pub fn into_value(self) -> T {
        match self {
            Resolved::Applied(v) => v,
            Resolved::Defaulted { value, .. } => value,
        }
    }

    /// Whether a default was substituted.
    pub fn is_defaulted(&self) -> bool {
        matches!(self, Resolved::Defaulted { .. })
    }

    /// Reason for the fallback, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Resolved::Applied(_) => None,
            Resolved::Defaulted { reason, .. } => Some(reason),
        }
    }

    /// Transform the value, keeping the fallback marker.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        match self {
            Resolved::Applied(v) => Resolved::Applied(f(v)),
            Resolved::Defaulted { value, reason } => Resolved::Defaulted {
                value: f(value),
                reason,
            },
        }
    }
}

impl<T: Copy> Resolved<T> {
    /// Copy out the resolved value.
    pub fn get(&self) -> T {
        *self.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applied() {
        let r = Resolved::Applied(3usize);
        assert_eq!(r.get(), 3);
        assert!(!r.is_defaulted());
        assert!(r.reason().is_none());
    }

    #[test]
    fn test_defaulted() {
        let r = Resolved::defaulted(0.5f64, "percentage 1.5 outside (0, 1]");
        assert_eq!(r.get(), 0.5);
        assert!(r.is_defaulted());
        assert!(r.reason().unwrap().contains("1.5"));
    }

    #[test]
    fn test_map_keeps_marker() {
        let r = Resolved::defaulted(2usize, "degraded").map(|v| v * 2);
        assert_eq!(r.into_value(), 4);

        let r = Resolved::defaulted(2usize, "degraded").map(|v| v + 1);
        assert!(r.is_defaulted());
    }
}
