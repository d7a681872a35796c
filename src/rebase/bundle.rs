use crate::rebase::timestamp::{encode_nanos, parse_nanos, Minima, Offsets, TimestampField};
use crate::rebase::RebaseError;
use serde_json::{Map, Value};
use std::io::{self, BufRead, Write};

/// One line of the input, parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// 1-based line number in the source file.
    pub line: usize,
    pub value: Value,
}

/// Every entry of a log file, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogBundle {
    entries: Vec<LogEntry>,
}

impl LogBundle {
    /// Parse newline-delimited JSON. Blank lines are skipped; the first line
    /// that fails to parse aborts the read.
    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self, RebaseError> {
        let mut entries = Vec::new();
        let mut buf = Vec::new();
        let mut line_number = 0;

        loop {
            buf.clear();
            // Raw bytes, so invalid UTF-8 surfaces as a JSON error on its line.
            if reader.read_until(b'\n', &mut buf).map_err(RebaseError::Read)? == 0 {
                break;
            }
            line_number += 1;

            if buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let value = serde_json::from_slice(&buf).map_err(|source| {
                RebaseError::MalformedJson {
                    line: line_number,
                    source,
                }
            })?;
            entries.push(LogEntry {
                line: line_number,
                value,
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| log_records(&entry.value).count())
            .sum()
    }

    /// First pass: minimum of each timestamp field across the whole bundle.
    pub fn scan_minima(&self) -> Result<Minima, RebaseError> {
        let mut minima = Minima::default();

        for entry in &self.entries {
            for record in log_records(&entry.value) {
                for field in TimestampField::ALL {
                    if let Some(raw) = record.get(field.key()) {
                        minima.observe(field, parse_field(entry.line, field, raw)?);
                    }
                }
            }
        }

        Ok(minima)
    }

    /// Second pass: a copy of the bundle with every present timestamp shifted
    /// by its field's offset. Absent fields stay absent.
    pub fn rebased(&self, offsets: &Offsets) -> Result<LogBundle, RebaseError> {
        let mut entries = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            let mut value = entry.value.clone();
            for record in log_records_mut(&mut value) {
                for field in TimestampField::ALL {
                    if let Some(raw) = record.get_mut(field.key()) {
                        let original = parse_field(entry.line, field, raw)?;
                        let shifted = offsets.shift(field, original).ok_or(
                            RebaseError::OffsetOverflow {
                                field: field.key(),
                            },
                        )?;
                        *raw = encode_nanos(shifted);
                    }
                }
            }
            entries.push(LogEntry {
                line: entry.line,
                value,
            });
        }

        Ok(LogBundle { entries })
    }

    /// Write one compact JSON document per line, each newline-terminated.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for entry in &self.entries {
            serde_json::to_writer(&mut writer, &entry.value)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }
}

fn parse_field(line: usize, field: TimestampField, raw: &Value) -> Result<i128, RebaseError> {
    parse_nanos(raw).ok_or_else(|| RebaseError::InvalidTimestamp {
        line,
        field: field.key(),
        value: raw.to_string(),
    })
}

/// Log records of an entry: `resourceLogs[*].scopeLogs[*].logRecords[*]`.
/// Missing or non-array collections contribute nothing.
pub fn log_records(entry: &Value) -> impl Iterator<Item = &Map<String, Value>> {
    children(entry, "resourceLogs")
        .flat_map(|resource| children(resource, "scopeLogs"))
        .flat_map(|scope| children(scope, "logRecords"))
        .filter_map(Value::as_object)
}

fn log_records_mut(entry: &mut Value) -> impl Iterator<Item = &mut Map<String, Value>> {
    children_mut(entry, "resourceLogs")
        .flat_map(|resource| children_mut(resource, "scopeLogs"))
        .flat_map(|scope| children_mut(scope, "logRecords"))
        .filter_map(Value::as_object_mut)
}

fn children<'a>(node: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    node.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flat_map(|items| items.iter())
}

fn children_mut<'a>(node: &'a mut Value, key: &str) -> impl Iterator<Item = &'a mut Value> {
    node.get_mut(key)
        .and_then(Value::as_array_mut)
        .into_iter()
        .flat_map(|items| items.iter_mut())
}
