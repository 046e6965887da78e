//! In-memory tabular dataset with named, typed columns.
//!
//! A [`Dataset`] is loaded once and never mutated. Derived views (the clean
//! view after data-quality filtering, subsamples, outlier-free subsets) are
//! new datasets built with [`Dataset::select`] or [`Dataset::take`], which can
//! only drop or repeat existing rows.

use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};

/// Unique learner identifier.
pub const USER_ID: &str = "User_ID";
/// Learner age in whole years.
pub const AGE: &str = "Age";
/// Hours spent on the course.
pub const TIME_SPENT_HOURS: &str = "Time_Spent_Hours";
/// Completion flag, `Yes` or `No`.
pub const COMPLETED: &str = "Completed";
/// Course category.
pub const COURSE_TYPE: &str = "Course_Type";
/// Device the course was taken on.
pub const DEVICE_USED: &str = "Device_Used";

/// Positive level of the completion flag.
pub const COMPLETED_YES: &str = "Yes";
/// Negative level of the completion flag.
pub const COMPLETED_NO: &str = "No";

/// Type tag of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Integer,
    Categorical,
}

/// Column storage. The variant fixes the column type for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Numeric(Vec<f64>),
    Integer(Vec<i64>),
    Categorical(Vec<String>),
}

impl Column {
    /// Number of values in the column.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Integer(v) => v.len(),
            Self::Categorical(v) => v.len(),
        }
    }

    /// Returns true if the column holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn kind(&self) -> ColumnKind {
        match self {
            Self::Numeric(_) => ColumnKind::Numeric,
            Self::Integer(_) => ColumnKind::Integer,
            Self::Categorical(_) => ColumnKind::Categorical,
        }
    }

    fn take(&self, indices: &[usize]) -> Self {
        match self {
            Self::Numeric(v) => Self::Numeric(indices.iter().map(|&i| v[i]).collect()),
            Self::Integer(v) => Self::Integer(indices.iter().map(|&i| v[i]).collect()),
            Self::Categorical(v) => {
                Self::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// One row of the course completion table, as read from CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    #[serde(rename = "User_ID")]
    pub user_id: i64,
    #[serde(rename = "Age")]
    pub age: i64,
    #[serde(rename = "Time_Spent_Hours")]
    pub time_spent_hours: f64,
    #[serde(rename = "Completed")]
    pub completed: String,
    #[serde(rename = "Course_Type")]
    pub course_type: String,
    #[serde(rename = "Device_Used")]
    pub device_used: String,
}

/// Ordered collection of equally long, named, typed columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Builds a dataset from named columns.
    ///
    /// # Errors
    /// Returns [`StatsError::InvalidParameter`] if two columns share a name or
    /// the columns differ in length.
    pub fn new(columns: Vec<(String, Column)>) -> StatsResult<Self> {
        let rows = columns.first().map_or(0, |(_, c)| c.len());
        let mut names = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len());

        for (name, column) in columns {
            if names.contains(&name) {
                return Err(StatsError::InvalidParameter(format!(
                    "duplicate column name '{name}'"
                )));
            }
            if column.len() != rows {
                return Err(StatsError::InvalidParameter(format!(
                    "column '{name}' has {} values, expected {rows}",
                    column.len()
                )));
            }
            names.push(name);
            data.push(column);
        }

        Ok(Self {
            names,
            columns: data,
            rows,
        })
    }

    /// Builds the fixed course completion schema from parsed records.
    ///
    /// # Errors
    /// [`StatsError::InvalidColumn`] on `User_ID` if two records share an id.
    pub fn from_records(records: &[CourseRecord]) -> StatsResult<Self> {
        let mut seen = std::collections::HashSet::with_capacity(records.len());
        if let Some((row, dup)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| !seen.insert(r.user_id))
        {
            return Err(StatsError::invalid_column(
                USER_ID,
                format!("duplicate id {} at row {row}", dup.user_id),
            ));
        }

        let columns = vec![
            (
                USER_ID.to_string(),
                Column::Integer(records.iter().map(|r| r.user_id).collect()),
            ),
            (
                AGE.to_string(),
                Column::Integer(records.iter().map(|r| r.age).collect()),
            ),
            (
                TIME_SPENT_HOURS.to_string(),
                Column::Numeric(records.iter().map(|r| r.time_spent_hours).collect()),
            ),
            (
                COMPLETED.to_string(),
                Column::Categorical(records.iter().map(|r| r.completed.clone()).collect()),
            ),
            (
                COURSE_TYPE.to_string(),
                Column::Categorical(records.iter().map(|r| r.course_type.clone()).collect()),
            ),
            (
                DEVICE_USED.to_string(),
                Column::Categorical(records.iter().map(|r| r.device_used.clone()).collect()),
            ),
        ];

        let (names, columns) = columns.into_iter().unzip();
        Ok(Self {
            names,
            columns,
            rows: records.len(),
        })
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Returns true if the dataset has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Column names in declaration order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    fn require(&self, name: &str) -> StatsResult<&Column> {
        self.column(name)
            .ok_or_else(|| StatsError::invalid_column(name, "column not found"))
    }

    /// Returns a numeric view of a column. Integer columns widen to `f64`.
    ///
    /// # Errors
    /// [`StatsError::InvalidColumn`] if the column is missing or categorical.
    pub fn numeric(&self, name: &str) -> StatsResult<Vec<f64>> {
        match self.require(name)? {
            Column::Numeric(v) => Ok(v.clone()),
            Column::Integer(v) => Ok(v.iter().map(|&x| x as f64).collect()),
            Column::Categorical(_) => Err(StatsError::invalid_column(
                name,
                "expected a numeric column, found categorical",
            )),
        }
    }

    /// Returns the raw values of an integer column.
    ///
    /// # Errors
    /// [`StatsError::InvalidColumn`] if the column is missing or not integer.
    pub fn integer(&self, name: &str) -> StatsResult<&[i64]> {
        match self.require(name)? {
            Column::Integer(v) => Ok(v),
            other => Err(StatsError::invalid_column(
                name,
                format!("expected an integer column, found {:?}", other.kind()),
            )),
        }
    }

    /// Returns the labels of a categorical column.
    ///
    /// # Errors
    /// [`StatsError::InvalidColumn`] if the column is missing or numeric.
    pub fn categorical(&self, name: &str) -> StatsResult<&[String]> {
        match self.require(name)? {
            Column::Categorical(v) => Ok(v),
            other => Err(StatsError::invalid_column(
                name,
                format!("expected a categorical column, found {:?}", other.kind()),
            )),
        }
    }

    /// Keeps the rows whose mask entry is `true`.
    ///
    /// # Errors
    /// [`StatsError::InvalidParameter`] if the mask length differs from the row count.
    pub fn select(&self, mask: &[bool]) -> StatsResult<Self> {
        if mask.len() != self.rows {
            return Err(StatsError::InvalidParameter(format!(
                "mask has {} entries, dataset has {} rows",
                mask.len(),
                self.rows
            )));
        }
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        self.take(&indices)
    }

    /// Builds a dataset from the given row indices, in order.
    ///
    /// # Errors
    /// [`StatsError::InvalidParameter`] if any index is out of range.
    pub fn take(&self, indices: &[usize]) -> StatsResult<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.rows) {
            return Err(StatsError::InvalidParameter(format!(
                "row index {bad} out of range for {} rows",
                self.rows
            )));
        }
        Ok(Self {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            rows: indices.len(),
        })
    }
}
