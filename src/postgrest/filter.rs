//! Filter expressions for PostgREST queries

use std::fmt;

/// A single `column.eq.value` condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq<V: ToString>(column: &str, value: V) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    /// The right-hand side of a top-level `column=eq.value` query parameter
    pub fn param_value(&self) -> String {
        format!("eq.{}", self.value)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.eq.{}", self.column, self.value)
    }
}

/// Value of an `or=` parameter matching any of the given conjunctions.
///
/// `[[a, b], [c, d]]` renders as `(and(a,b),and(c,d))`; single-condition
/// groups are written bare.
pub fn any_of(groups: &[Vec<Filter>]) -> String {
    let parts: Vec<String> = groups
        .iter()
        .map(|group| match group.as_slice() {
            [single] => single.to_string(),
            many => format!(
                "and({})",
                many.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
            ),
        })
        .collect();
    format!("({})", parts.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_two_way_conversation_filter() {
        let filter = any_of(&[
            vec![Filter::eq("sender_id", "u1"), Filter::eq("receiver_id", "u2")],
            vec![Filter::eq("sender_id", "u2"), Filter::eq("receiver_id", "u1")],
        ]);
        assert_eq!(
            filter,
            "(and(sender_id.eq.u1,receiver_id.eq.u2),and(sender_id.eq.u2,receiver_id.eq.u1))"
        );
    }

    #[test]
    fn single_condition_groups_are_bare() {
        let filter = any_of(&[vec![Filter::eq("id", 1)], vec![Filter::eq("booking_id", "b-1")]]);
        assert_eq!(filter, "(id.eq.1,booking_id.eq.b-1)");
    }
}
