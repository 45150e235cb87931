/// A trait to format a number of seconds as a compact uptime, e.g. `3d 4h 5m 6s`.
pub trait Uptime {
    /// Treats `self` as seconds. Leading zero units are omitted, zero formats as `0s`.
    fn to_uptime(self) -> String;
}

macro_rules! impl_uptime {
    ($($t:ty)*) => ($(
        impl Uptime for $t {
            fn to_uptime(self) -> String {
                format_uptime(self as u128)
            }
        }
    )*)
}

impl_uptime! { u32 u64 u128 usize }

fn format_uptime(seconds: u128) -> String {
    let units = [(seconds / 86_400, "d"), (seconds / 3_600 % 24, "h"), (seconds / 60 % 60, "m"), (seconds % 60, "s")];

    let parts: Vec<String> = units
        .iter()
        .skip_while(|(value, _)| *value == 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect();

    if parts.is_empty() { "0s".to_string() } else { parts.join(" ") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0s")]
    #[case(59, "59s")]
    #[case(60, "1m 0s")]
    #[case(3_661, "1h 1m 1s")]
    #[case(273_906, "3d 4h 5m 6s")]
    #[case(86_400, "1d 0h 0m 0s")]
    fn uptime_u64(#[case] input: u64, #[case] expected: &str) {
        assert_eq!(input.to_uptime(), expected);
    }

    #[test]
    fn uptime_for_other_widths() {
        assert_eq!(90_u32.to_uptime(), "1m 30s");
        assert_eq!(90_usize.to_uptime(), "1m 30s");
        assert_eq!(90_u128.to_uptime(), "1m 30s");
    }
}
