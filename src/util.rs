use crate::{Error, Result};

/// Which ends of an interval are included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bounds {
    /// `[a, b]`
    Closed,
    /// `(a, b]`
    OpenLow,
    /// `[a, b)`
    OpenHigh,
}

impl Bounds {
    fn contains(self, value: f32, a: f32, b: f32) -> bool {
        match self {
            Bounds::Closed => value >= a && value <= b,
            Bounds::OpenLow => value > a && value <= b,
            Bounds::OpenHigh => value >= a && value < b,
        }
    }

    fn describe(self, a: f32, b: f32) -> String {
        match self {
            Bounds::Closed => format!("[{a}, {b}]"),
            Bounds::OpenLow => format!("({a}, {b}]"),
            Bounds::OpenHigh => format!("[{a}, {b})"),
        }
    }
}

/// Checks that `value` lies in the interval described by `a`, `b` and `bounds`.
/// NaN is never in range.
pub(crate) fn check_interval(name: &str, value: f32, a: f32, b: f32, bounds: Bounds) -> Result<()> {
    if bounds.contains(value, a, b) {
        Ok(())
    } else {
        Err(Error::configuration(
            name,
            value,
            format!("must be in the interval {}", bounds.describe(a, b)),
        ))
    }
}

/// Returns early with a [`Error::Configuration`] naming the variable if it is
/// outside of the provided interval
///
/// ### Example
/// ```ignore
/// let learning_rate = 2.0;
/// ensure_interval!(learning_rate, 0.0, 1.0, Bounds::OpenLow);
/// ```
/// This returns "invalid configuration for \`learning_rate\` = 2: must be in the interval (0, 1]".
macro_rules! ensure_interval {
    ($var:ident, $a:expr, $b:expr) => {
        $crate::util::ensure_interval!($var, $a, $b, $crate::util::Bounds::Closed)
    };
    ($var:ident, $a:expr, $b:expr, $bounds:expr) => {
        $crate::util::check_interval(stringify!($var), $var, $a, $b, $bounds)?
    };
}

pub(crate) use ensure_interval;

/// Milliseconds since the unix epoch
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(rate: f32, bounds: Bounds) -> Result<()> {
        ensure_interval!(rate, 0.0, 1.0, bounds);
        Ok(())
    }

    #[test]
    fn ensure_interval_functional() {
        assert!(validate(0.0, Bounds::Closed).is_ok());
        assert!(validate(1.0, Bounds::Closed).is_ok());
        assert!(validate(0.0, Bounds::OpenLow).is_err());
        assert!(validate(1.0, Bounds::OpenHigh).is_err());
        assert!(validate(f32::NAN, Bounds::Closed).is_err());
    }

    #[test]
    fn ensure_interval_names_variable() {
        let err = validate(1.5, Bounds::OpenLow).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration for `rate` = 1.5: must be in the interval (0, 1]",
            "Message names the parameter and interval"
        );
    }
}
