use chrono::{DateTime, Utc};
use serde_json::Value;

/// Nanoseconds since the Unix epoch. Wider than `i64` so values outside the
/// 64-bit range still parse; arithmetic on it is checked.
pub type UnixNanos = i128;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// The two timestamp fields carried by a log record. Each kind gets its own
/// offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampField {
    Time,
    ObservedTime,
}

impl TimestampField {
    pub const ALL: [TimestampField; 2] = [TimestampField::Time, TimestampField::ObservedTime];

    /// Key of the field inside a log record object.
    pub fn key(self) -> &'static str {
        match self {
            TimestampField::Time => "timeUnixNano",
            TimestampField::ObservedTime => "observedTimeUnixNano",
        }
    }
}

/// Parse a timestamp value. The wire format is a decimal string; bare JSON
/// integers are accepted too.
pub fn parse_nanos(value: &Value) -> Option<UnixNanos> {
    match value {
        Value::String(s) => s.trim().parse::<i128>().ok(),
        // Numbers keep their source text, so integers wider than 64 bits
        // parse exactly and floats are rejected.
        Value::Number(n) => n.to_string().parse::<i128>().ok(),
        _ => None,
    }
}

/// Encode a timestamp in the wire format (a decimal string).
pub fn encode_nanos(nanos: UnixNanos) -> Value {
    Value::String(nanos.to_string())
}

/// UTC rendering for diagnostics, or `None` when outside chrono's range.
pub fn human_readable(nanos: UnixNanos) -> Option<String> {
    let secs = i64::try_from(nanos.div_euclid(NANOS_PER_SEC)).ok()?;
    let subsec = u32::try_from(nanos.rem_euclid(NANOS_PER_SEC)).ok()?;
    DateTime::<Utc>::from_timestamp(secs, subsec)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string())
}

/// Source of "now". Read exactly once per rebase run.
pub trait Clock {
    fn now_unix_nanos(&self) -> UnixNanos;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_nanos(&self) -> UnixNanos {
        let now = Utc::now();
        i128::from(now.timestamp()) * NANOS_PER_SEC + i128::from(now.timestamp_subsec_nanos())
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub UnixNanos);

impl Clock for FixedClock {
    fn now_unix_nanos(&self) -> UnixNanos {
        self.0
    }
}

/// Running minimum of each field, over records where that field is present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Minima {
    time: Option<UnixNanos>,
    observed_time: Option<UnixNanos>,
}

impl Minima {
    pub fn observe(&mut self, field: TimestampField, value: UnixNanos) {
        let slot = match field {
            TimestampField::Time => &mut self.time,
            TimestampField::ObservedTime => &mut self.observed_time,
        };
        *slot = Some(slot.map_or(value, |current| current.min(value)));
    }

    pub fn get(&self, field: TimestampField) -> Option<UnixNanos> {
        match field {
            TimestampField::Time => self.time,
            TimestampField::ObservedTime => self.observed_time,
        }
    }

    /// Fields that never appeared in any record.
    pub fn missing_fields(&self) -> Vec<TimestampField> {
        TimestampField::ALL
            .into_iter()
            .filter(|field| self.get(*field).is_none())
            .collect()
    }
}

/// Why offsets could not be derived from a set of minima.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OffsetError {
    /// Fields that never appeared in any record.
    MissingFields(Vec<TimestampField>),
    /// `now - min` does not fit in `UnixNanos`.
    Overflow(TimestampField),
}

/// One offset per field kind, shared by every record in the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offsets {
    pub time: UnixNanos,
    pub observed_time: UnixNanos,
}

impl Offsets {
    /// `now - min` for each field.
    pub fn from_minima(now: UnixNanos, minima: &Minima) -> Result<Self, OffsetError> {
        let missing = minima.missing_fields();
        if !missing.is_empty() {
            return Err(OffsetError::MissingFields(missing));
        }

        let offset = |field: TimestampField| {
            minima
                .get(field)
                .and_then(|min| now.checked_sub(min))
                .ok_or(OffsetError::Overflow(field))
        };

        Ok(Self {
            time: offset(TimestampField::Time)?,
            observed_time: offset(TimestampField::ObservedTime)?,
        })
    }

    /// `value` moved by this field's offset, or `None` on overflow.
    pub fn shift(&self, field: TimestampField, value: UnixNanos) -> Option<UnixNanos> {
        value.checked_add(self.get(field))
    }

    pub fn get(&self, field: TimestampField) -> UnixNanos {
        match field {
            TimestampField::Time => self.time,
            TimestampField::ObservedTime => self.observed_time,
        }
    }
}
