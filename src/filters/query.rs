use super::compile::{compile_query, Where};
use super::{Filter, FilterId, Join, Schema};

/// An ordered list of filters and the join combining them.
///
/// Edits return a new value. After every change to the filter list the join
/// resets to the default once one filter or none is left, since a join over
/// a single filter means nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Query<S: Schema> {
    filters: Vec<Filter<S>>,
    join: Join,
}

impl<S: Schema> Default for Query<S> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            join: Join::default(),
        }
    }
}

impl<S: Schema> Query<S> {
    /// Build a query as read from a URL. The join is kept as given.
    pub fn new(filters: Vec<Filter<S>>, join: Join) -> Self {
        Self { filters, join }
    }

    pub fn filters(&self) -> &[Filter<S>] {
        &self.filters
    }

    pub fn join(&self) -> Join {
        self.join
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Append `filter`, or replace the filter with the same id in place.
    pub fn with_filter(mut self, filter: Filter<S>) -> Self {
        match self.filters.iter().position(|f| f.id == filter.id) {
            Some(idx) => self.filters[idx] = filter,
            None => self.filters.push(filter),
        }
        self.settle()
    }

    /// Drop the filter with `id`. Unknown ids leave the query unchanged.
    pub fn without_filter(mut self, id: &FilterId) -> Self {
        let before = self.filters.len();
        self.filters.retain(|f| &f.id != id);
        if self.filters.len() == before {
            return self;
        }
        self.settle()
    }

    pub fn cleared(self) -> Self {
        Self::default()
    }

    pub fn with_join(mut self, join: Join) -> Self {
        self.join = join;
        self
    }

    pub fn cycle_join(self) -> Self {
        let next = self.join.next();
        self.with_join(next)
    }

    /// Compile into the query engine's predicate.
    pub fn compile(&self) -> Where {
        compile_query(self.join, &self.filters)
    }

    fn settle(mut self) -> Self {
        if self.filters.len() <= 1 {
            self.join = Join::default();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::product::{Product, ProductNumeric};
    use crate::filters::NumericCondition;

    fn price(id: &str, cond: NumericCondition) -> Filter<Product> {
        Filter::numeric(ProductNumeric::Price, cond).with_id(id)
    }

    fn two_filters_or() -> Query<Product> {
        Query::new(
            vec![
                price("a", NumericCondition::Gt(100.into())),
                price("b", NumericCondition::Lt(200.into())),
            ],
            Join::Or,
        )
    }

    #[test]
    fn removing_down_to_one_filter_resets_join() {
        let query = two_filters_or().without_filter(&FilterId::from("a"));
        assert_eq!(query.len(), 1);
        assert_eq!(query.join(), Join::And);
    }

    #[test]
    fn removing_unknown_id_keeps_join() {
        let query = two_filters_or().without_filter(&FilterId::from("zz"));
        assert_eq!(query.len(), 2);
        assert_eq!(query.join(), Join::Or);
    }

    #[test]
    fn join_survives_while_more_than_one_filter_remains() {
        let query = two_filters_or()
            .with_filter(price("c", NumericCondition::Is(150.into())))
            .without_filter(&FilterId::from("a"));
        assert_eq!(query.len(), 2);
        assert_eq!(query.join(), Join::Or);
    }

    #[test]
    fn with_filter_updates_in_place_by_id() {
        let query = two_filters_or().with_filter(price("a", NumericCondition::Gte(90.into())));
        assert_eq!(query.len(), 2);
        assert_eq!(query.filters()[0].condition(), "gte");
        assert_eq!(query.filters()[1].condition(), "lt");
    }

    #[test]
    fn cleared_query_is_default() {
        let query = two_filters_or().cycle_join().cleared();
        assert!(query.is_empty());
        assert_eq!(query.join(), Join::And);
    }

    #[test]
    fn cycle_join_moves_to_next() {
        assert_eq!(two_filters_or().cycle_join().join(), Join::Not);
    }
}
