//! Record filters for `find` and identity lookups

use census_api::{Query, SearchModifier, Term};

/// A set of field conditions a record must satisfy.
///
/// Filters are translated to Census search terms by [`Filter::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    terms: Vec<Term>,
    sort: Vec<(String, bool)>,
    case_insensitive: bool,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`
    pub fn eq(self, field: impl Into<String>, value: impl ToString) -> Self {
        self.term(Term::new(field, value))
    }

    /// Require `field` to compare to `value` using `modifier`
    pub fn compare(
        self,
        field: impl Into<String>,
        modifier: SearchModifier,
        value: impl ToString,
    ) -> Self {
        self.term(Term::new(field, value).with_modifier(modifier))
    }

    pub fn term(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    /// Order results by `field`
    pub fn sort(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.sort.push((field.into(), ascending));
        self
    }

    /// Compare string values without regard to case
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn sorting(&self) -> &[(String, bool)] {
        &self.sort
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Add the filter's terms and commands to a query
    pub fn apply(&self, query: Query) -> Query {
        let mut query = self
            .terms
            .iter()
            .cloned()
            .fold(query, |q, term| q.add_term(term));
        for (field, ascending) in &self.sort {
            query = query.sort(field.clone(), *ascending);
        }
        if self.case_insensitive {
            query = query.case(false);
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_to_query() {
        let filter = Filter::new()
            .eq("faction_id", 2)
            .compare("max_stack_size", SearchModifier::GreaterThan, 1)
            .sort("item_id", true)
            .case_insensitive();

        let query = filter.apply(Query::new("item"));
        assert_eq!(query.terms().len(), 2);
        assert_eq!(query.terms()[1].to_string(), "max_stack_size=>1");

        let commands = query.commands();
        assert!(commands.contains(&("c:sort".to_string(), "item_id".to_string())));
        assert!(commands.contains(&("c:case".to_string(), "0".to_string())));
    }

    #[test]
    fn test_empty_filter() {
        let filter = Filter::new();
        assert!(filter.is_empty());
        assert!(filter.apply(Query::new("world")).commands().is_empty());
    }
}
