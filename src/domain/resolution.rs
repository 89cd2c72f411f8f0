// Bucket resolution for aggregated queries
use crate::error::AppError;
use chrono::Duration;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    #[default]
    Minute,
    FiveMinutes,
    Hour,
    Full,
}

impl Resolution {
    /// Parses a query parameter. An empty value means `minute`.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "" | "minute" => Ok(Resolution::Minute),
            "five_minutes" => Ok(Resolution::FiveMinutes),
            "hour" => Ok(Resolution::Hour),
            "full" => Ok(Resolution::Full),
            other => Err(AppError::InvalidResolution(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Minute => "minute",
            Resolution::FiveMinutes => "five_minutes",
            Resolution::Hour => "hour",
            Resolution::Full => "full",
        }
    }

    /// Width of one bucket; `None` for raw observations.
    pub fn bucket(&self) -> Option<Duration> {
        match self {
            Resolution::Minute => Some(Duration::minutes(1)),
            Resolution::FiveMinutes => Some(Duration::minutes(5)),
            Resolution::Hour => Some(Duration::hours(1)),
            Resolution::Full => None,
        }
    }

    /// "five_minutes" -> "Five Minutes"
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromStr for Resolution {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resolution::parse(s)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Resolution::parse("").unwrap(), Resolution::Minute);
        assert_eq!(Resolution::parse("minute").unwrap(), Resolution::Minute);
        assert_eq!(Resolution::parse("five_minutes").unwrap(), Resolution::FiveMinutes);
        assert_eq!(Resolution::parse("hour").unwrap(), Resolution::Hour);
        assert_eq!(Resolution::parse("full").unwrap(), Resolution::Full);
        assert!(matches!(
            Resolution::parse("day"),
            Err(AppError::InvalidResolution(r)) if r == "day"
        ));
    }

    #[test]
    fn test_title() {
        assert_eq!(Resolution::FiveMinutes.title(), "Five Minutes");
        assert_eq!(Resolution::Hour.title(), "Hour");
    }

    #[test]
    fn test_bucket() {
        assert_eq!(Resolution::FiveMinutes.bucket(), Some(Duration::minutes(5)));
        assert_eq!(Resolution::Full.bucket(), None);
    }
}
