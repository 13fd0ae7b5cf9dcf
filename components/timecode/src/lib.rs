use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimecodeError {
    #[error("unrecognized timestamp notation: {0:?}")]
    UnrecognizedNotation(String),

    #[error("timestamp component out of range: {0:?}")]
    OutOfRange(String),

    #[error("timestamp must be a finite, non-negative number of seconds, got {0}")]
    NegativeOrNonFinite(f64),
}

/// An offset into a video, stored as seconds.
///
/// Parses the notations accepted on the command line and in URL start
/// hints:
/// - `HH:MM:SS` or `M:SS` (the seconds component may be fractional)
/// - bare seconds: `180`, `180.5`
/// - unit notation: `180s`, `3m0s`, `1h2m3.5s`, `3 min 0 seconds`
///
/// # Examples
/// ```
/// # use timecode::{Timecode, TimecodeError};
/// let at: Timecode = "00:09:40".parse()?;
/// assert_eq!(at.as_secs(), 580.0);
///
/// let at: Timecode = "3m0s".parse()?;
/// assert_eq!(at.as_secs(), 180.0);
/// # Ok::<(), TimecodeError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timecode(f64);

impl Timecode {
    pub const ZERO: Self = Self(0.0);

    /// Create a timecode from a number of seconds.
    pub fn from_secs(secs: f64) -> Result<Self, TimecodeError> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(TimecodeError::NegativeOrNonFinite(secs));
        }
        Ok(Self(secs))
    }

    pub fn as_secs(&self) -> f64 {
        self.0
    }

    /// Shift forward by a number of seconds, saturating at zero.
    pub fn offset_by(&self, secs: f64) -> Self {
        Self((self.0 + secs).max(0.0))
    }

    /// Filename-safe `HH-MM-SS` form, truncated to the whole second.
    pub fn hms_slug(&self) -> String {
        let whole = self.rounded_millis() / 1000;
        format!(
            "{:02}-{:02}-{:02}",
            whole / 3600,
            (whole % 3600) / 60,
            whole % 60
        )
    }

    fn rounded_millis(&self) -> u64 {
        (self.0 * 1000.0).round() as u64
    }
}

/// Renders `HH:MM:SS` with a trailing-zero-trimmed millisecond part when
/// the offset is not on a whole second, e.g. `00:09:40.1`. This is the
/// form handed to ffmpeg's `-ss`.
impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_ms = self.rounded_millis();
        let whole = total_ms / 1000;
        let ms = total_ms % 1000;
        write!(
            f,
            "{:02}:{:02}:{:02}",
            whole / 3600,
            (whole % 3600) / 60,
            whole % 60
        )?;
        if ms > 0 {
            let frac = format!("{ms:03}");
            write!(f, ".{}", frac.trim_end_matches('0'))?;
        }
        Ok(())
    }
}

impl FromStr for Timecode {
    type Err = TimecodeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        if s.is_empty() {
            return Err(TimecodeError::UnrecognizedNotation(input.to_string()));
        }
        let secs = if s.contains(':') {
            parse_colon(s)?
        } else if is_decimal(s) {
            parse_decimal(s)?
        } else {
            parse_units(s)?
        };
        Self::from_secs(secs)
    }
}

/// `HH:MM:SS` or `M:SS`; hours and minutes are unsigned integers, the
/// seconds component may carry a fractional part.
fn parse_colon(s: &str) -> Result<f64, TimecodeError> {
    let parts: Vec<&str> = s.split(':').map(str::trim).collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, sec] => ("0", *m, *sec),
        [h, m, sec] => (*h, *m, *sec),
        _ => return Err(TimecodeError::UnrecognizedNotation(s.to_string())),
    };
    let hours = parse_uint(hours, s)?;
    let minutes = parse_uint(minutes, s)?;
    let seconds = ensure_decimal(seconds, s).and_then(parse_decimal)?;
    let whole = hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .ok_or_else(|| TimecodeError::OutOfRange(s.to_string()))?;
    Ok(whole as f64 + seconds)
}

/// Unit notation: a sequence of `<number><unit>` groups in strictly
/// decreasing unit order, a trailing bare number counting as seconds.
/// Missing units default to zero.
fn parse_units(s: &str) -> Result<f64, TimecodeError> {
    let lower = s.to_ascii_lowercase();
    let mut rest = lower.as_str();
    let mut total = 0.0;
    let mut last_weight = f64::INFINITY;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let number_end = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        if number_end == 0 {
            return Err(TimecodeError::UnrecognizedNotation(s.to_string()));
        }
        let number = &rest[..number_end];
        rest = rest[number_end..].trim_start();

        let unit_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let weight = match unit {
            "h" | "hr" | "hrs" | "hour" | "hours" => 3600.0,
            "m" | "min" | "mins" | "minute" | "minutes" => 60.0,
            "" | "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
            _ => return Err(TimecodeError::UnrecognizedNotation(s.to_string())),
        };
        // Units may not repeat or run backwards (e.g. "3s5m", "5m5m").
        if weight >= last_weight {
            return Err(TimecodeError::UnrecognizedNotation(s.to_string()));
        }
        // Fractional parts only make sense on the seconds component.
        if weight > 1.0 && number.contains('.') {
            return Err(TimecodeError::UnrecognizedNotation(s.to_string()));
        }
        total += ensure_decimal(number, s).and_then(parse_decimal)? * weight;
        last_weight = weight;
    }
    if last_weight.is_infinite() {
        return Err(TimecodeError::UnrecognizedNotation(s.to_string()));
    }
    Ok(total)
}

fn parse_uint(part: &str, whole: &str) -> Result<u64, TimecodeError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimecodeError::UnrecognizedNotation(whole.to_string()));
    }
    part.parse()
        .map_err(|_| TimecodeError::OutOfRange(whole.to_string()))
}

/// Restrict to plain decimal digits with at most one dot, so that f64
/// oddities like `inf`, `nan` and `1e3` never slip through.
fn ensure_decimal<'a>(part: &'a str, whole: &str) -> Result<&'a str, TimecodeError> {
    let digits = part.bytes().filter(|b| b.is_ascii_digit()).count();
    let dots = part.bytes().filter(|&b| b == b'.').count();
    if digits == 0 || dots > 1 || digits + dots != part.len() {
        return Err(TimecodeError::UnrecognizedNotation(whole.to_string()));
    }
    Ok(part)
}

fn is_decimal(s: &str) -> bool {
    ensure_decimal(s, s).is_ok()
}

fn parse_decimal(part: &str) -> Result<f64, TimecodeError> {
    part.parse()
        .map_err(|_| TimecodeError::OutOfRange(part.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case("00:09:40", 580.0)]
    #[case("9:40", 580.0)]
    #[case("3:00", 180.0)]
    #[case("1:02:03.5", 3723.5)]
    #[case("00:00:00", 0.0)]
    #[case("180", 180.0)]
    #[case("180.5", 180.5)]
    #[case("9.40", 9.4)]
    #[case("180s", 180.0)]
    #[case("8s", 8.0)]
    #[case("3m0s", 180.0)]
    #[case("1h2m3s", 3723.0)]
    #[case("1h2m3.5s", 3723.5)]
    #[case("90m", 5400.0)]
    #[case("2h", 7200.0)]
    #[case("3 min 0 seconds", 180.0)]
    #[case("  3:00  ", 180.0)]
    fn parses_documented_notations(#[case] input: &str, #[case] expected: f64) {
        let parsed: Timecode = input.parse().unwrap();
        assert_eq!(parsed.as_secs(), expected, "input {input:?}");
    }

    #[rstest]
    #[case("abc")]
    #[case("")]
    #[case("   ")]
    #[case("-5")]
    #[case("-0:30")]
    #[case("1:2:3:4")]
    #[case(":30")]
    #[case("12:")]
    #[case("1..5")]
    #[case("5m5m")]
    #[case("3s5m")]
    #[case("1.5m")]
    #[case("3x")]
    #[case("inf")]
    #[case("nan")]
    #[case("1e3")]
    fn rejects_everything_outside_the_grammar(#[case] input: &str) {
        assert_matches!(
            input.parse::<Timecode>(),
            Err(TimecodeError::UnrecognizedNotation(_)),
            "input {input:?}"
        );
    }

    #[test]
    fn colon_form_is_exact() {
        let parsed: Timecode = "02:17:36.25".parse().unwrap();
        assert_eq!(parsed.as_secs(), 2.0 * 3600.0 + 17.0 * 60.0 + 36.25);
    }

    #[test]
    fn from_secs_rejects_negative_and_non_finite() {
        assert_matches!(
            Timecode::from_secs(-1.0),
            Err(TimecodeError::NegativeOrNonFinite(_))
        );
        assert_matches!(
            Timecode::from_secs(f64::NAN),
            Err(TimecodeError::NegativeOrNonFinite(_))
        );
        assert!(Timecode::from_secs(0.0).is_ok());
    }

    #[rstest]
    #[case(580.0, "00:09:40")]
    #[case(580.1, "00:09:40.1")]
    #[case(3723.25, "01:02:03.25")]
    #[case(0.0, "00:00:00")]
    #[case(0.001, "00:00:00.001")]
    fn displays_trimmed_hhmmss(#[case] secs: f64, #[case] expected: &str) {
        let at = Timecode::from_secs(secs).unwrap();
        assert_eq!(at.to_string(), expected);
    }

    #[test]
    fn slug_truncates_to_the_whole_second() {
        assert_eq!(Timecode::from_secs(580.9).unwrap().hms_slug(), "00-09-40");
        assert_eq!(Timecode::from_secs(0.0).unwrap().hms_slug(), "00-00-00");
        assert_eq!(
            Timecode::from_secs(3723.5).unwrap().hms_slug(),
            "01-02-03"
        );
    }

    #[test]
    fn offset_by_shifts_and_saturates() {
        let at = Timecode::from_secs(580.0).unwrap();
        assert_eq!(at.offset_by(0.9).as_secs(), 580.9);
        assert_eq!(Timecode::ZERO.offset_by(-5.0), Timecode::ZERO);
    }

    #[test]
    fn serializes_transparently() {
        let at = Timecode::from_secs(580.5).unwrap();
        let json = serde_json::to_string(&at).unwrap();
        assert_eq!(json, "580.5");
        let decoded: Timecode = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, at);
    }
}
