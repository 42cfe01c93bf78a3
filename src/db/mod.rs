pub mod duck;
pub mod postgres;

use itertools::Itertools;

use crate::schema::Column;

/// Quote an identifier so mixed case names like `VendorID` survive.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// The statements that replace `table` with an empty one.
pub fn replace_table_sql(table: &str, columns: &[Column]) -> (String, String) {
    let table = quote_ident(table);
    let drop = format!("DROP TABLE IF EXISTS {}", table);
    let create = format!(
        "CREATE TABLE {} (\n    {}\n)",
        table,
        columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.kind.sql_type()))
            .join(",\n    ")
    );
    (drop, create)
}

/// A multi-row insert for `rows` rows.  The `placeholder` closure is given
/// the one based parameter position.
pub fn insert_sql<F>(table: &str, columns: &[Column], rows: usize, placeholder: F) -> String
where
    F: Fn(usize) -> String,
{
    let n = columns.len();
    let values = (0..rows)
        .map(|i| format!("({})", (1..=n).map(|j| placeholder(i * n + j)).join(", ")))
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(table),
        columns.iter().map(|c| quote_ident(&c.name)).join(", "),
        values
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    #[test]
    fn quoting() {
        assert_eq!(quote_ident("VendorID"), "\"VendorID\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn replace_statements() {
        let columns = vec![
            Column::new("VendorID", FieldType::Int),
            Column::new("tpep_pickup_datetime", FieldType::Timestamp),
        ];
        let (drop, create) = replace_table_sql("yellow_taxi_data", &columns);
        assert_eq!(drop, "DROP TABLE IF EXISTS \"yellow_taxi_data\"");
        assert_eq!(
            create,
            "CREATE TABLE \"yellow_taxi_data\" (\n    \"VendorID\" BIGINT,\n    \"tpep_pickup_datetime\" TIMESTAMP\n)"
        );
    }

    #[test]
    fn insert_placeholders() {
        let columns = vec![
            Column::new("a", FieldType::Int),
            Column::new("b", FieldType::Text),
        ];
        let sql = insert_sql("t", &columns, 2, |i| format!("${}", i));
        assert_eq!(
            sql,
            "INSERT INTO \"t\" (\"a\", \"b\") VALUES ($1, $2), ($3, $4)"
        );
        let sql = insert_sql("t", &columns, 1, |_| "?".to_string());
        assert_eq!(sql, "INSERT INTO \"t\" (\"a\", \"b\") VALUES (?, ?)");
    }
}
