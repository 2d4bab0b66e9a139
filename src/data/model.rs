use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDateTime;

use crate::config::FieldNames;

// ---------------------------------------------------------------------------
// CellValue – a single spreadsheet cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring what spreadsheet readers hand back.
/// Filter selections live in `BTreeSet`s so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Native date/time cell (wall-clock, no zone).
    DateTime(NaiveDateTime),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                DateTime(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::DateTime(d) => d.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) if v.is_nan() => write!(f, "NaN"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::DateTime(d) => write!(f, "{}", d.format("%Y-%m-%dT%H:%M:%S")),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Absent, NaN, or an empty string. Columns made only of these are dropped.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Interpret the value as a number. Text is parsed leniently; NaN and
    /// anything unparseable yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            CellValue::Float(v) => *v,
            CellValue::Integer(i) => *i as f64,
            CellValue::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        (!v.is_nan()).then_some(v)
    }

    /// Whether the value has a numeric storage type (ignores text).
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Float(_))
    }
}

// ---------------------------------------------------------------------------
// Record – one measurement row
// ---------------------------------------------------------------------------

/// A single measurement row with its fixed core schema and the remaining
/// columns kept as extra fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Category label (vessel name) attached at ingestion.
    pub category: String,
    /// Derived from the date and time fields by the pipeline.
    pub timestamp: Option<NaiveDateTime>,
    /// Every other column: column_name → value.
    pub fields: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            timestamp: None,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter, mostly handy when assembling rows by hand.
    pub fn with(mut self, column: impl Into<String>, value: CellValue) -> Self {
        self.fields.insert(column.into(), value);
        self
    }

    /// Look a column up, treating the category and timestamp columns as
    /// views of the typed fields. A record without a derived timestamp shows
    /// its source timestamp column, if any. Missing columns read as `Null`.
    pub fn value(&self, column: &str, names: &FieldNames) -> CellValue {
        if column == names.category {
            return CellValue::String(self.category.clone());
        }
        if column == names.timestamp {
            if let Some(ts) = self.timestamp {
                return CellValue::DateTime(ts);
            }
        }
        self.fields.get(column).cloned().unwrap_or(CellValue::Null)
    }

    /// Borrow an extra field, `None` when absent.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the rows of one file, or the merged collection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Extra-field column names in source header order.
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether at least one record carries a derived timestamp.
    pub fn has_timestamps(&self) -> bool {
        self.records.iter().any(|r| r.timestamp.is_some())
    }

    /// Append another dataset, extending the column list with any columns
    /// this one has not seen yet.
    pub fn merge(&mut self, other: Dataset) {
        for col in other.columns {
            if !self.columns.contains(&col) {
                self.columns.push(col);
            }
        }
        self.records.extend(other.records);
    }

    /// Distinct category labels, sorted.
    pub fn categories(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.category.clone()).collect()
    }

    /// For each requested column the sorted set of values it takes.
    pub fn unique_values(
        &self,
        columns: &[String],
        names: &FieldNames,
    ) -> BTreeMap<String, BTreeSet<CellValue>> {
        let mut unique: BTreeMap<String, BTreeSet<CellValue>> = BTreeMap::new();
        for col in columns {
            let set = unique.entry(col.clone()).or_default();
            for rec in &self.records {
                set.insert(rec.value(col, names));
            }
        }
        unique
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn emptiness_predicate() {
        assert!(CellValue::Null.is_empty());
        assert!(CellValue::Float(f64::NAN).is_empty());
        assert!(CellValue::String(String::new()).is_empty());
        assert!(!CellValue::Float(0.0).is_empty());
        assert!(!CellValue::Integer(0).is_empty());
        assert!(!CellValue::String(" ".into()).is_empty());
        assert!(!CellValue::Bool(false).is_empty());
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(CellValue::Integer(4).as_f64(), Some(4.0));
        assert_eq!(CellValue::String(" 2.5 ".into()).as_f64(), Some(2.5));
        assert_eq!(CellValue::String("n/a".into()).as_f64(), None);
        assert_eq!(CellValue::Float(f64::NAN).as_f64(), None);
        assert_eq!(CellValue::Bool(true).as_f64(), None);
    }

    #[test]
    fn ordering_groups_by_kind() {
        let mut set = BTreeSet::new();
        set.insert(CellValue::String("b".into()));
        set.insert(CellValue::Integer(3));
        set.insert(CellValue::Null);
        set.insert(CellValue::String("a".into()));
        let order: Vec<_> = set.into_iter().collect();
        assert_eq!(
            order,
            vec![
                CellValue::Null,
                CellValue::Integer(3),
                CellValue::String("a".into()),
                CellValue::String("b".into()),
            ]
        );
    }

    #[test]
    fn record_value_exposes_core_fields() {
        let names = FieldNames::default();
        let ts = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let mut rec = Record::new("Aurora").with("COMP_NAME", CellValue::String("Pump".into()));
        rec.timestamp = Some(ts);

        assert_eq!(
            rec.value("VESSEL_NAME", &names),
            CellValue::String("Aurora".into())
        );
        assert_eq!(rec.value("TIMESTAMP", &names), CellValue::DateTime(ts));
        assert_eq!(
            rec.value("COMP_NAME", &names),
            CellValue::String("Pump".into())
        );
        assert_eq!(rec.value("MISSING", &names), CellValue::Null);

        let raw = Record::new("Aurora").with("TIMESTAMP", CellValue::String("noon".into()));
        assert_eq!(raw.value("TIMESTAMP", &names), CellValue::String("noon".into()));
        assert_eq!(Record::new("Aurora").value("TIMESTAMP", &names), CellValue::Null);
    }

    #[test]
    fn merge_extends_columns_in_order() {
        let mut a = Dataset::new(
            vec!["A".into(), "B".into()],
            vec![Record::new("one")],
        );
        let b = Dataset::new(vec!["B".into(), "C".into()], vec![Record::new("two")]);
        a.merge(b);
        assert_eq!(a.columns, vec!["A", "B", "C"]);
        assert_eq!(a.len(), 2);
        assert_eq!(a.categories().len(), 2);
    }
}
