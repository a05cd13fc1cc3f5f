//! Number formatting for display slots
//!
//! All rounding goes through Rust's float formatting, which rounds the exact
//! binary value of the `f64` to the nearest representable decimal and sends
//! exact ties to the even digit. `18.005` is stored as `18.00499...` and so
//! rounds down to `18.00`.

/// Unit suffix for temperatures
pub const CELSIUS: &str = "°C";
/// Unit suffix for precipitation amounts
pub const MILLIMETRES: &str = "mm";
/// Unit suffix for wind speed
pub const KMH: &str = "km/h";
/// Unit suffix for wind direction
pub const DEGREES: &str = "°";

/// Text shown for values that are missing or not yet fetched
pub const MISSING: &str = "--";

/// Decimal places used for current temperatures and all daily fields
pub const TEMPERATURE_PLACES: usize = 2;
/// Decimal places used for wind speed and direction
pub const WIND_PLACES: usize = 3;

/// Rounds `value` to `places` decimals and strips trailing zeros and a
/// trailing decimal point. Non-finite values render as [`MISSING`].
///
/// ```
/// use wxpanel::format::trimmed;
///
/// assert_eq!(trimmed(21.0, 2), "21");
/// assert_eq!(trimmed(21.5, 2), "21.5");
/// assert_eq!(trimmed(21.456, 2), "21.46");
/// ```
pub fn trimmed(value: f64, places: usize) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }

    let fixed = format!("{:.*}", places, value);
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };

    // -0.001 rounds to "-0"
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Renders a value without rounding, using the shortest decimal form that
/// round-trips to the same `f64`.
pub fn unrounded(value: f64) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }
    if value == 0.0 {
        // Covers -0.0 as well
        return "0".to_string();
    }
    value.to_string()
}

/// Appends a unit suffix separated by a space, except for degree marks which
/// attach directly to the number.
pub fn with_unit(number: &str, unit: &str) -> String {
    if unit == DEGREES {
        format!("{}{}", number, unit)
    } else {
        format!("{} {}", number, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trimmed_drops_trailing_zeros() {
        assert_eq!(trimmed(21.0, 2), "21");
        assert_eq!(trimmed(21.5, 2), "21.5");
        assert_eq!(trimmed(21.45, 2), "21.45");
        assert_eq!(trimmed(20.1, 2), "20.1");
    }

    #[test]
    fn test_trimmed_rounds_to_two_places() {
        assert_eq!(trimmed(21.456, 2), "21.46");
        assert_eq!(trimmed(23.333, 2), "23.33");
        assert_eq!(trimmed(17.99, 2), "17.99");
        assert_eq!(trimmed(9.9999, 2), "10");
    }

    #[test]
    fn test_trimmed_uses_exact_binary_value() {
        // 18.005 is stored just below the midpoint
        assert_eq!(trimmed(18.005, 2), "18");
        // 2.675 likewise
        assert_eq!(trimmed(2.675, 2), "2.67");
    }

    #[test]
    fn test_trimmed_three_places() {
        assert_eq!(trimmed(12.3456, 3), "12.346");
        assert_eq!(trimmed(270.0, 3), "270");
        assert_eq!(trimmed(5.1234, 3), "5.123");
    }

    #[test]
    fn test_trimmed_negative_values() {
        assert_eq!(trimmed(-3.456, 2), "-3.46");
        assert_eq!(trimmed(-0.001, 2), "0");
        assert_eq!(trimmed(-2.0, 2), "-2");
    }

    #[test]
    fn test_trimmed_integer_places() {
        assert_eq!(trimmed(7.0, 0), "7");
        assert_eq!(trimmed(10.0, 0), "10");
    }

    #[test]
    fn test_trimmed_non_finite() {
        assert_eq!(trimmed(f64::NAN, 2), MISSING);
        assert_eq!(trimmed(f64::INFINITY, 2), MISSING);
        assert_eq!(unrounded(f64::NAN), MISSING);
    }

    #[test]
    fn test_unrounded_keeps_full_precision() {
        assert_eq!(unrounded(0.1), "0.1");
        assert_eq!(unrounded(1.23456789), "1.23456789");
        assert_eq!(unrounded(0.0), "0");
        assert_eq!(unrounded(-0.0), "0");
        assert_eq!(unrounded(2.0), "2");
    }

    #[test]
    fn test_with_unit() {
        assert_eq!(with_unit("21.46", CELSIUS), "21.46 °C");
        assert_eq!(with_unit("0.2", MILLIMETRES), "0.2 mm");
        assert_eq!(with_unit("12.5", KMH), "12.5 km/h");
        assert_eq!(with_unit("270", DEGREES), "270°");
    }
}
