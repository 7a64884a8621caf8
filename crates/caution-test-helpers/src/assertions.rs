//! Assertion macros for detector and engine tests.

/// Assert that a list of driver snapshots holds exactly the given car ids,
/// in any order.
///
/// ```rust
/// use caution_telemetry::{DriverId, DriverSnapshot};
/// use caution_test_helpers::assert_drivers;
///
/// let drivers = vec![DriverSnapshot::new(DriverId(3)), DriverSnapshot::new(DriverId(1))];
/// assert_drivers!(&drivers, [1, 3]);
/// ```
#[macro_export]
macro_rules! assert_drivers {
    ($drivers:expr, [$($id:expr),* $(,)?] $(,)?) => {{
        let mut actual: ::std::vec::Vec<i32> = $drivers.iter().map(|d| d.driver_id.0).collect();
        actual.sort_unstable();
        let mut expected: ::std::vec::Vec<i32> = ::std::vec![$($id),*];
        expected.sort_unstable();
        if actual != expected {
            panic!(
                "assertion failed: driver ids differ\n  actual: `{:?}`,\nexpected: `{:?}`",
                actual, expected
            );
        }
    }};
}

/// Assert that a value lies within an inclusive range.
///
/// ```rust
/// use caution_test_helpers::assert_in_range;
///
/// assert_in_range!(0.3, 0.0, 1.0);
/// ```
#[macro_export]
macro_rules! assert_in_range {
    ($value:expr, $min:expr, $max:expr $(,)?) => {{
        let value = $value;
        let min = $min;
        let max = $max;
        if value < min || value > max {
            panic!(
                "assertion failed: `{:?}` is not within [{:?}, {:?}]",
                value, min, max
            );
        }
    }};
}
