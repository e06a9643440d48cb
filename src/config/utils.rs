use std::fmt::Display;
use std::str::FromStr;

/// Parse a numeric configuration value, naming the setting on failure
pub fn parse_number<T>(name: &str, value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| format!("Invalid {name} value '{value}': {e}"))
}
