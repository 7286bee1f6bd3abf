//! Classification results.
//!
//! The worker produces a [`ResultSet`]; the codec turns it into a two-column
//! numeric table; the client decodes that table into a [`ResultTable`].
//! The two sides are separate types because the wire carries labels as
//! `f64`, so a decoded table is a grid of reals, not of `(i64, f64)` pairs.

/// One prediction: a class label and its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultRow {
    pub label: i64,
    pub score: f64,
}

impl ResultRow {
    pub fn new(label: i64, score: f64) -> Self {
        Self { label, score }
    }
}

impl From<(i64, f64)> for ResultRow {
    fn from((label, score): (i64, f64)) -> Self {
        Self { label, score }
    }
}

/// Ordered sequence of predictions, possibly empty.
///
/// Empty means "no usable prediction".  The client cannot tell whether that
/// was because the frame was malformed, the frame was empty, or inference
/// failed; the protocol has no error channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    rows: Vec<ResultRow>,
}

impl ResultSet {
    /// The empty result set.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRow> {
        self.rows.iter()
    }
}

impl From<Vec<ResultRow>> for ResultSet {
    fn from(rows: Vec<ResultRow>) -> Self {
        Self { rows }
    }
}

impl<R: Into<ResultRow>> FromIterator<R> for ResultSet {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ResultRow;
    type IntoIter = std::slice::Iter<'a, ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// A decoded reply table: `rows × 2` reals, `[label, score]` per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<[f64; 2]>,
}

impl ResultTable {
    pub fn new(rows: Vec<[f64; 2]>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[[f64; 2]] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` for the zero-row "no prediction" table.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Always 2; present so callers can assert the table is rectangular.
    pub fn columns(&self) -> usize {
        crate::protocol::messages::TABLE_COLUMNS
    }

    pub fn into_rows(self) -> Vec<[f64; 2]> {
        self.rows
    }
}
