//! Record store query parameters.

/// Filters, ordering and limits for a record store request, rendered as
/// `PostgREST` query parameters (`column=eq.value`, `order=column.desc`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    /// An unfiltered query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep rows whose `column` equals `value`.
    #[must_use]
    pub fn eq(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filter(column, "eq", value)
    }

    /// Order by `column`, newest or largest first.
    #[must_use]
    pub fn order_desc(self, column: &str) -> Self {
        self.param("order", format!("{column}.desc"))
    }

    /// Order by `column`, smallest first.
    #[must_use]
    pub fn order_asc(self, column: &str) -> Self {
        self.param("order", format!("{column}.asc"))
    }

    /// Return at most `count` rows.
    #[must_use]
    pub fn limit(self, count: usize) -> Self {
        self.param("limit", count.to_string())
    }

    /// Only return the listed columns.
    #[must_use]
    pub fn select(self, columns: &str) -> Self {
        self.param("select", columns.to_string())
    }

    /// Rendered parameters, in insertion order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    fn filter(self, column: &str, operator: &str, value: impl std::fmt::Display) -> Self {
        self.param(column, format!("{operator}.{value}"))
    }

    fn param(mut self, key: &str, value: String) -> Self {
        self.params.push((key.to_string(), value));
        self
    }
}
