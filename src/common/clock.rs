// src/common/clock.rs

use std::fmt;
use std::str::FromStr;

use crate::common::error::AppError;

/// Horário local "HH:mm" sem fuso, guardado como minutos desde 00:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl FromStr for ClockTime {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::bad_request(format!("Invalid time '{}'. Please use HH:mm", s));

        let (hours, minutes) = s.trim().split_once(':').ok_or_else(invalid)?;
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 || !digits(hours) || !digits(minutes) {
            return Err(invalid());
        }

        let hours: u16 = hours.parse().map_err(|_| invalid())?;
        let minutes: u16 = minutes.parse().map_err(|_| invalid())?;
        if hours > 23 || minutes > 59 {
            return Err(invalid());
        }

        Ok(Self(hours * 60 + minutes))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_minutes(u32::from(self.0)))
    }
}

/// Formata minutos como "HH:mm". Aceita 1440 (fim do dia) como "24:00".
pub fn format_minutes(total: u32) -> String {
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_zero_padded() {
        let t: ClockTime = "09:05".parse().unwrap();
        assert_eq!(t.minutes(), 9 * 60 + 5);
        assert_eq!(t.to_string(), "09:05");

        let loose: ClockTime = "9:30".parse().unwrap();
        assert_eq!(loose.to_string(), "09:30");
    }

    #[test]
    fn rejects_malformed_values() {
        for raw in ["", "0900", "24:00", "12:60", "ab:cd", "12:5", "123:00", "-1:00"] {
            assert!(raw.parse::<ClockTime>().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn end_of_day_is_formattable() {
        assert_eq!(format_minutes(1440), "24:00");
        let t: ClockTime = "23:30".parse().unwrap();
        assert_eq!(format_minutes(u32::from(t.minutes()) + 30), "24:00");
    }
}
