use crate::errors::{RasterError, Result};

/// Type of a [`RasterAttributeTable`] column.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RatFieldType {
    Integer,
    Real,
    String,
}

/// Semantic role of a [`RasterAttributeTable`] column.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RatFieldUsage {
    #[default]
    Generic,
    PixelCount,
    Name,
    Min,
    Max,
    MinMax,
    Red,
    Green,
    Blue,
    Alpha,
}

#[derive(Debug, Clone, PartialEq)]
enum ColumnValues {
    Integer(Vec<i64>),
    Real(Vec<f64>),
    String(Vec<String>),
}

impl ColumnValues {
    fn resize(&mut self, rows: usize) {
        match self {
            ColumnValues::Integer(v) => v.resize(rows, 0),
            ColumnValues::Real(v) => v.resize(rows, 0.0),
            ColumnValues::String(v) => v.resize(rows, String::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    usage: RatFieldUsage,
    values: ColumnValues,
}

/// A raster attribute table: typed columns associating values with pixel values
/// or ranges.
///
/// Values are converted between column types on access.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RasterAttributeTable {
    columns: Vec<Column>,
    rows: usize,
}

impl RasterAttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Resize every column, padding with zeros or empty strings.
    pub fn set_row_count(&mut self, rows: usize) {
        for column in &mut self.columns {
            column.values.resize(rows);
        }
        self.rows = rows;
    }

    pub fn create_column(&mut self, name: &str, field_type: RatFieldType, usage: RatFieldUsage) {
        let mut values = match field_type {
            RatFieldType::Integer => ColumnValues::Integer(Vec::new()),
            RatFieldType::Real => ColumnValues::Real(Vec::new()),
            RatFieldType::String => ColumnValues::String(Vec::new()),
        };
        values.resize(self.rows);
        self.columns.push(Column {
            name: name.to_string(),
            usage,
            values,
        });
    }

    pub fn column_name(&self, col: usize) -> Option<&str> {
        self.columns.get(col).map(|c| c.name.as_str())
    }

    pub fn column_usage(&self, col: usize) -> Option<RatFieldUsage> {
        self.columns.get(col).map(|c| c.usage)
    }

    pub fn column_type(&self, col: usize) -> Option<RatFieldType> {
        self.columns.get(col).map(|c| match c.values {
            ColumnValues::Integer(_) => RatFieldType::Integer,
            ColumnValues::Real(_) => RatFieldType::Real,
            ColumnValues::String(_) => RatFieldType::String,
        })
    }

    /// Index of the first column with the given usage.
    pub fn column_of_usage(&self, usage: RatFieldUsage) -> Option<usize> {
        self.columns.iter().position(|c| c.usage == usage)
    }

    pub fn value_as_string(&self, row: usize, col: usize) -> Result<String> {
        Ok(match &self.cell(row, col)?.values {
            ColumnValues::Integer(v) => v[row].to_string(),
            ColumnValues::Real(v) => v[row].to_string(),
            ColumnValues::String(v) => v[row].clone(),
        })
    }

    pub fn value_as_int(&self, row: usize, col: usize) -> Result<i64> {
        Ok(match &self.cell(row, col)?.values {
            ColumnValues::Integer(v) => v[row],
            ColumnValues::Real(v) => v[row] as i64,
            ColumnValues::String(v) => v[row].trim().parse().unwrap_or(0),
        })
    }

    pub fn value_as_double(&self, row: usize, col: usize) -> Result<f64> {
        Ok(match &self.cell(row, col)?.values {
            ColumnValues::Integer(v) => v[row] as f64,
            ColumnValues::Real(v) => v[row],
            ColumnValues::String(v) => v[row].trim().parse().unwrap_or(0.0),
        })
    }

    /// Set a value; writing to the row just past the end appends a row.
    pub fn set_value_as_string(&mut self, row: usize, col: usize, value: &str) -> Result<()> {
        match &mut self.cell_mut(row, col)?.values {
            ColumnValues::Integer(v) => v[row] = value.trim().parse().unwrap_or(0),
            ColumnValues::Real(v) => v[row] = value.trim().parse().unwrap_or(0.0),
            ColumnValues::String(v) => v[row] = value.to_string(),
        }
        Ok(())
    }

    pub fn set_value_as_int(&mut self, row: usize, col: usize, value: i64) -> Result<()> {
        match &mut self.cell_mut(row, col)?.values {
            ColumnValues::Integer(v) => v[row] = value,
            ColumnValues::Real(v) => v[row] = value as f64,
            ColumnValues::String(v) => v[row] = value.to_string(),
        }
        Ok(())
    }

    pub fn set_value_as_double(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        match &mut self.cell_mut(row, col)?.values {
            ColumnValues::Integer(v) => v[row] = value as i64,
            ColumnValues::Real(v) => v[row] = value,
            ColumnValues::String(v) => v[row] = value.to_string(),
        }
        Ok(())
    }

    fn cell(&self, row: usize, col: usize) -> Result<&Column> {
        if row >= self.rows {
            return Err(RasterError::BadArgument(format!(
                "row {row} out of range, table has {} rows",
                self.rows
            )));
        }
        self.columns.get(col).ok_or_else(|| {
            RasterError::BadArgument(format!(
                "column {col} out of range, table has {} columns",
                self.columns.len()
            ))
        })
    }

    fn cell_mut(&mut self, row: usize, col: usize) -> Result<&mut Column> {
        if col >= self.columns.len() {
            return Err(RasterError::BadArgument(format!(
                "column {col} out of range, table has {} columns",
                self.columns.len()
            )));
        }
        if row == self.rows {
            self.set_row_count(row + 1);
        } else if row > self.rows {
            return Err(RasterError::BadArgument(format!(
                "row {row} out of range, table has {} rows",
                self.rows
            )));
        }
        Ok(&mut self.columns[col])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_and_rows() {
        let mut rat = RasterAttributeTable::new();
        rat.create_column("value", RatFieldType::Integer, RatFieldUsage::MinMax);
        rat.create_column("name", RatFieldType::String, RatFieldUsage::Name);
        assert_eq!(rat.column_count(), 2);
        assert_eq!(rat.column_type(1), Some(RatFieldType::String));
        assert_eq!(rat.column_of_usage(RatFieldUsage::Name), Some(1));

        rat.set_value_as_int(0, 0, 3).unwrap();
        rat.set_value_as_string(0, 1, "water").unwrap();
        rat.set_value_as_double(1, 0, 7.9).unwrap();
        assert_eq!(rat.row_count(), 2);
        assert_eq!(rat.value_as_int(1, 0).unwrap(), 7);
        assert_eq!(rat.value_as_string(0, 1).unwrap(), "water");
        assert_eq!(rat.value_as_string(1, 1).unwrap(), "");
        assert_eq!(rat.value_as_double(0, 0).unwrap(), 3.0);

        assert!(rat.set_value_as_int(5, 0, 1).is_err());
        assert!(rat.value_as_int(0, 2).is_err());
    }
}
