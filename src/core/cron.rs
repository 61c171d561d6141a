//! Syntax check for standard cron expressions.
//!
//! Five-field expressions (minute, hour, day of month, month, day of week)
//! are parsed with `croner`. On top of that come the `@yearly`,
//! `@annually`, `@monthly`, `@weekly`, `@daily`, `@midnight`, `@hourly` and
//! `@every <duration>` descriptors; and a leading `CRON_TZ=` or `TZ=` zone.

/// Why an expression was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CronError {
    /// Nothing but whitespace.
    #[error("empty cron expression")]
    Empty,

    /// Not exactly five fields.
    #[error("expected exactly 5 fields, found {0}")]
    FieldCount(usize),

    /// A `@...` descriptor that is not known.
    #[error("unrecognized descriptor: {0}")]
    UnknownDescriptor(String),

    /// `@every` with a malformed duration.
    #[error("failed to parse duration {0}")]
    InvalidDuration(String),

    /// The five fields do not form a valid schedule.
    #[error("{0}")]
    Invalid(String),
}

const FIELD_COUNT: usize = 5;

const DESCRIPTORS: &[&str] = &[
    "@yearly",
    "@annually",
    "@monthly",
    "@weekly",
    "@daily",
    "@midnight",
    "@hourly",
];

/// Check that `expr` is a valid standard cron expression.
pub fn validate(expr: &str) -> Result<(), CronError> {
    let mut schedule = expr.trim();
    if schedule.is_empty() {
        return Err(CronError::Empty);
    }

    if schedule.starts_with("TZ=") || schedule.starts_with("CRON_TZ=") {
        schedule = match schedule.split_once(char::is_whitespace) {
            Some((_, rest)) => rest.trim_start(),
            None => "",
        };
        if schedule.is_empty() {
            return Err(CronError::Empty);
        }
    }

    if let Some(rest) = schedule.strip_prefix("@every ") {
        return validate_duration(rest.trim());
    }
    if schedule.starts_with('@') {
        return if DESCRIPTORS.contains(&schedule) {
            Ok(())
        } else {
            Err(CronError::UnknownDescriptor(schedule.to_string()))
        };
    }

    let fields = schedule.split_whitespace().count();
    if fields != FIELD_COUNT {
        return Err(CronError::FieldCount(fields));
    }
    croner::Cron::new(schedule)
        .parse()
        .map(|_| ())
        .map_err(|e| CronError::Invalid(e.to_string()))
}

/// Durations are written as `<number><unit>` pairs, e.g. `1h30m` or `1.5h`.
fn validate_duration(text: &str) -> Result<(), CronError> {
    let invalid = || CronError::InvalidDuration(text.to_string());
    if text == "0" {
        return Ok(());
    }
    if text.is_empty() {
        return Err(invalid());
    }

    let mut rest = text;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_len];
        if number.is_empty() || number == "." || number.matches('.').count() > 1 {
            return Err(invalid());
        }
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        match &rest[..unit_len] {
            "ns" | "us" | "µs" | "ms" | "s" | "m" | "h" => {}
            _ => return Err(invalid()),
        }
        rest = &rest[unit_len..];
    }
    Ok(())
}
