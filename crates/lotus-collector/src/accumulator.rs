use std::{collections::BTreeMap, fmt::Write as _, io::Write};

/// The primitive value kinds the sink accepts. Nothing nested, nothing
/// arbitrary-precision.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Int(i64),
    UInt(u64),
    Bool(bool),
    Text(String),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// One flat measurement ready for the sink.
#[derive(Debug, Clone, Default)]
pub struct MetricRecord {
    pub measurement: &'static str,
    pub fields: BTreeMap<String, FieldValue>,
    pub tags: BTreeMap<String, String>,
}

impl MetricRecord {
    pub fn new(measurement: &'static str) -> Self {
        Self {
            measurement,
            fields: BTreeMap::new(),
            tags: BTreeMap::new(),
        }
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Fire-and-forget metric sink.
pub trait Accumulator {
    fn emit(&mut self, record: MetricRecord);
}

/// Collects records in memory; the sink used by tests.
#[derive(Debug, Default)]
pub struct MemoryAccumulator {
    pub records: Vec<MetricRecord>,
}

impl MemoryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_measurement(&self, measurement: &str) -> Vec<&MetricRecord> {
        self.records
            .iter()
            .filter(|r| r.measurement == measurement)
            .collect()
    }
}

impl Accumulator for MemoryAccumulator {
    fn emit(&mut self, record: MetricRecord) {
        self.records.push(record);
    }
}

/// Writes InfluxDB line protocol, one line per record, to the wrapped
/// writer. Timestamps are left to the receiving end.
pub struct LineProtocolAccumulator<W: Write> {
    out: W,
}

impl<W: Write> LineProtocolAccumulator<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }

    fn render(record: &MetricRecord) -> String {
        let mut line = escape_key(record.measurement);
        for (key, value) in &record.tags {
            let _ = write!(line, ",{}={}", escape_key(key), escape_key(value));
        }

        let mut first = true;
        for (key, value) in &record.fields {
            let sep = if first { ' ' } else { ',' };
            first = false;
            let _ = write!(line, "{sep}{}={}", escape_key(key), render_value(value));
        }
        line
    }
}

impl<W: Write> Accumulator for LineProtocolAccumulator<W> {
    fn emit(&mut self, record: MetricRecord) {
        if record.fields.is_empty() {
            // A line without fields is invalid line protocol.
            return;
        }
        let line = Self::render(&record);
        if let Err(err) = writeln!(self.out, "{line}") {
            tracing::error!(?err, "writing metric line failed");
        }
    }
}

fn escape_key(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

fn render_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(v) => format!("{v}"),
        FieldValue::Int(v) => format!("{v}i"),
        FieldValue::UInt(v) => format!("{v}u"),
        FieldValue::Bool(v) => format!("{v}"),
        FieldValue::Text(v) => format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")),
    }
}
