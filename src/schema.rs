use std::fmt::Display;

use chrono::NaiveDateTime;

use crate::error::ParseError;

/// Semantic type of a csv field.  Determines both how a cell is parsed and
/// the SQL type of the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Float,
    Text,
    Timestamp,
}

impl FieldType {
    /// Column type understood by both Postgres and DuckDB.
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldType::Int => "BIGINT",
            FieldType::Float => "DOUBLE PRECISION",
            FieldType::Text => "TEXT",
            FieldType::Timestamp => "TIMESTAMP",
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use FieldType::*;
        match self {
            Int => write!(f, "integer"),
            Float => write!(f, "float"),
            Text => write!(f, "text"),
            Timestamp => write!(f, "timestamp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: FieldType,
}

impl Column {
    pub fn new<S: Into<String>>(name: S, kind: FieldType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// The declared types for the fields of a csv file.  Fields present in the
/// header but not declared here are read as text.  Timestamp fields are
/// required to be present in the header.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Column>,
}

impl Schema {
    pub fn new(fields: Vec<Column>) -> Self {
        Self { fields }
    }

    /// Schema of the monthly yellow taxi trip files.
    pub fn yellow_trip() -> Self {
        use FieldType::*;
        let fields = [
            ("VendorID", Int),
            ("tpep_pickup_datetime", Timestamp),
            ("tpep_dropoff_datetime", Timestamp),
            ("passenger_count", Int),
            ("trip_distance", Float),
            ("RatecodeID", Int),
            ("store_and_fwd_flag", Text),
            ("PULocationID", Int),
            ("DOLocationID", Int),
            ("payment_type", Int),
            ("fare_amount", Float),
            ("extra", Float),
            ("mta_tax", Float),
            ("tip_amount", Float),
            ("tolls_amount", Float),
            ("improvement_surcharge", Float),
            ("total_amount", Float),
            ("congestion_surcharge", Float),
        ];
        Self::new(
            fields
                .into_iter()
                .map(|(name, kind)| Column::new(name, kind))
                .collect(),
        )
    }

    pub fn field_type(&self, name: &str) -> FieldType {
        self.fields
            .iter()
            .find(|c| c.name == name)
            .map_or(FieldType::Text, |c| c.kind)
    }

    /// Type the columns of a csv header.  Fails if a timestamp field is
    /// missing from the header.
    pub fn resolve<'a, I>(&self, header: I) -> Result<Vec<Column>, ParseError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let columns: Vec<Column> = header
            .into_iter()
            .map(|name| Column::new(name, self.field_type(name)))
            .collect();
        for field in self.fields.iter().filter(|c| c.kind == FieldType::Timestamp) {
            if !columns.iter().any(|c| c.name == field.name) {
                return Err(ParseError::MissingColumn(field.name.clone()));
            }
        }
        Ok(columns)
    }
}

/// One parsed cell.  Every variant is nullable, an empty cell is `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
    Timestamp(Option<NaiveDateTime>),
}

const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

impl Value {
    /// Parse the raw cell `s` as `kind`.  On failure return the name of the
    /// expected type so the caller can report row and column.  Text is kept
    /// verbatim, numbers and timestamps are trimmed first.
    pub fn parse(s: &str, kind: FieldType) -> Result<Value, &'static str> {
        let s = match kind {
            FieldType::Text => s,
            _ => s.trim(),
        };
        if s.is_empty() {
            return Ok(Value::null(kind));
        }
        match kind {
            FieldType::Int => parse_int(s).map(|v| Value::Int(Some(v))).ok_or("integer"),
            FieldType::Float => s
                .parse::<f64>()
                .map(|v| Value::Float(Some(v)))
                .map_err(|_| "float"),
            FieldType::Text => Ok(Value::Text(Some(s.to_string()))),
            FieldType::Timestamp => TIMESTAMP_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|v| Value::Timestamp(Some(v)))
                .ok_or("timestamp"),
        }
    }

    pub fn null(kind: FieldType) -> Value {
        match kind {
            FieldType::Int => Value::Int(None),
            FieldType::Float => Value::Float(None),
            FieldType::Text => Value::Text(None),
            FieldType::Timestamp => Value::Timestamp(None),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Int(v) => v.is_none(),
            Value::Float(v) => v.is_none(),
            Value::Text(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
        }
    }
}

/// Integer columns sometimes come written as floats, e.g. `1.0`.  Accept
/// those as long as there is no fractional part.
fn parse_int(s: &str) -> Option<i64> {
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let x = s.parse::<f64>().ok()?;
    if x.fract() == 0.0 && x.abs() < i64::MAX as f64 {
        Some(x as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parse_values() {
        assert_eq!(Value::parse("2", FieldType::Int), Ok(Value::Int(Some(2))));
        assert_eq!(Value::parse("2.0", FieldType::Int), Ok(Value::Int(Some(2))));
        assert_eq!(Value::parse("2.5", FieldType::Int), Err("integer"));
        assert_eq!(
            Value::parse("-0.5", FieldType::Float),
            Ok(Value::Float(Some(-0.5)))
        );
        assert_eq!(Value::parse("abc", FieldType::Float), Err("float"));
        assert_eq!(
            Value::parse("N", FieldType::Text),
            Ok(Value::Text(Some("N".to_string())))
        );
        let dt = NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(0, 30, 10)
            .unwrap();
        assert_eq!(
            Value::parse("2021-01-01 00:30:10", FieldType::Timestamp),
            Ok(Value::Timestamp(Some(dt)))
        );
        assert_eq!(
            Value::parse("2021-01-01T00:30:10", FieldType::Timestamp),
            Ok(Value::Timestamp(Some(dt)))
        );
        assert_eq!(
            Value::parse("01/01/2021", FieldType::Timestamp),
            Err("timestamp")
        );
    }

    #[test]
    fn fractional_seconds() {
        let dt = NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_milli_opt(0, 30, 10, 250)
            .unwrap();
        assert_eq!(
            Value::parse("2021-01-01 00:30:10.250", FieldType::Timestamp),
            Ok(Value::Timestamp(Some(dt)))
        );
        assert_eq!(
            Value::parse("2021-01-01T00:30:10.25", FieldType::Timestamp),
            Ok(Value::Timestamp(Some(dt)))
        );
    }

    #[test]
    fn text_keeps_whitespace_numbers_do_not() {
        assert_eq!(
            Value::parse(" N ", FieldType::Text),
            Ok(Value::Text(Some(" N ".to_string())))
        );
        assert_eq!(Value::parse(" 3 ", FieldType::Int), Ok(Value::Int(Some(3))));
        assert_eq!(Value::parse("  ", FieldType::Float), Ok(Value::Float(None)));
        assert_eq!(
            Value::parse(" 2021-01-01 00:30:10 ", FieldType::Timestamp),
            Value::parse("2021-01-01 00:30:10", FieldType::Timestamp)
        );
    }

    #[test]
    fn empty_cells_are_null() {
        for kind in [
            FieldType::Int,
            FieldType::Float,
            FieldType::Text,
            FieldType::Timestamp,
        ] {
            let v = Value::parse("", kind).unwrap();
            assert!(v.is_null());
            assert_eq!(v, Value::null(kind));
        }
    }

    #[test]
    fn resolve_header() {
        let schema = Schema::yellow_trip();
        let columns = schema
            .resolve(["VendorID", "tpep_pickup_datetime", "tpep_dropoff_datetime", "airport_fee"])
            .unwrap();
        assert_eq!(
            columns,
            vec![
                Column::new("VendorID", FieldType::Int),
                Column::new("tpep_pickup_datetime", FieldType::Timestamp),
                Column::new("tpep_dropoff_datetime", FieldType::Timestamp),
                Column::new("airport_fee", FieldType::Text),
            ]
        );
    }

    #[test]
    fn resolve_requires_timestamp_columns() {
        let schema = Schema::yellow_trip();
        let res = schema.resolve(["VendorID", "tpep_pickup_datetime"]);
        match res {
            Err(ParseError::MissingColumn(name)) => assert_eq!(name, "tpep_dropoff_datetime"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
