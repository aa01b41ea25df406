/// Projection, selection and operation clauses for one dataset query.
///
/// Order within each list is kept exactly as added. Nothing is deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClauseSet {
    projections: Vec<String>,
    selections: Vec<String>,
    operations: Vec<String>,
}

impl ClauseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projections(&self) -> &[String] {
        &self.projections
    }

    pub fn selections(&self) -> &[String] {
        &self.selections
    }

    pub fn operations(&self) -> &[String] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.projections.is_empty() && self.selections.is_empty() && self.operations.is_empty()
    }

    pub fn add_projection(&mut self, name: impl Into<String>) -> &mut Self {
        self.projections.push(name.into());
        self
    }

    /// Appends projections; their order becomes the output column order.
    pub fn add_projections<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projections.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn add_selection(&mut self, clause: impl Into<String>) -> &mut Self {
        self.selections.push(clause.into());
        self
    }

    pub fn add_operation(&mut self, clause: impl Into<String>) -> &mut Self {
        self.operations.push(clause.into());
        self
    }

    pub fn clear_projections(&mut self) -> &mut Self {
        self.projections.clear();
        self
    }

    pub fn clear_selections(&mut self) -> &mut Self {
        self.selections.clear();
        self
    }

    pub fn clear_operations(&mut self) -> &mut Self {
        self.operations.clear();
        self
    }

    /// Adds up to two bound selections on `target`: the start bound first, then the end bound.
    ///
    /// An empty `start` or `end` adds nothing for that side.
    pub fn select_range(
        &mut self,
        target: &str,
        start: &str,
        end: &str,
        start_inclusive: bool,
        end_inclusive: bool,
    ) -> &mut Self {
        if !start.is_empty() {
            let op = if start_inclusive { ">=" } else { ">" };
            self.selections.push(format!("{target}{op}{start}"));
        }
        if !end.is_empty() {
            let op = if end_inclusive { "<=" } else { "<" };
            self.selections.push(format!("{target}{op}{end}"));
        }
        self
    }

    pub fn select(&mut self, range: &RangeSelection) -> &mut Self {
        self.select_range(
            &range.target,
            &range.start,
            &range.end,
            range.start_inclusive,
            range.end_inclusive,
        )
    }
}

/// A bounded selection on one variable.
///
/// Defaults: target `time`, no bounds, start bound inclusive, end bound exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSelection {
    target: String,
    start: String,
    end: String,
    start_inclusive: bool,
    end_inclusive: bool,
}

impl Default for RangeSelection {
    fn default() -> Self {
        Self::on("time")
    }
}

impl RangeSelection {
    pub fn on(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            start: String::new(),
            end: String::new(),
            start_inclusive: true,
            end_inclusive: false,
        }
    }

    pub fn start(mut self, start: impl Into<String>) -> Self {
        self.start = start.into();
        self
    }

    pub fn end(mut self, end: impl Into<String>) -> Self {
        self.end = end.into();
        self
    }

    pub fn start_inclusive(mut self, inclusive: bool) -> Self {
        self.start_inclusive = inclusive;
        self
    }

    pub fn end_inclusive(mut self, inclusive: bool) -> Self {
        self.end_inclusive = inclusive;
        self
    }
}
