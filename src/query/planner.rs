use chrono::{DateTime, Utc};
use crate::core::types::Field;
use crate::index::field_indexes::IndexSet;
use crate::index::text::TextMatch;
use crate::query::rule::Rule;
use crate::query::types::{DateOperand, Operator};

/// Lower/upper bound pair; the flag marks an inclusive bound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<T> {
    pub lower: Option<(T, bool)>,
    pub upper: Option<(T, bool)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRange {
    Number(Bounds<f64>),
    Date(Bounds<DateTime<Utc>>),
}

/// Execution strategy chosen for one rule
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// Answer entirely from the field's text index
    TextSeek { field: Field, query: String, mode: TextMatch },
    /// Answer entirely from the field's sorted value index
    ValueRange { field: Field, range: ValueRange },
    /// Evaluate the rule against every track
    Scan,
}

/// Chooses between index lookups and a linear scan.
///
/// An index is used only when the whole rule is a single leaf it can answer
/// exactly; anything else, composites included, is scanned. Partial index
/// results are never mixed with scan results.
#[derive(Debug, Clone, Default)]
pub struct QueryPlanner {
    pub value_index_ranges: bool,
}

impl QueryPlanner {
    pub fn new(value_index_ranges: bool) -> Self {
        QueryPlanner { value_index_ranges }
    }

    /// `now` resolves relative date operands for range plans
    pub fn plan(&self, rule: &Rule, now: DateTime<Utc>) -> Plan {
        if let Rule::StringMetadata(leaf) = rule {
            if leaf.requires_indexing() {
                let mode = match leaf.operator {
                    Operator::StartsWith => TextMatch::StartsWith,
                    _ => TextMatch::Contains,
                };
                return Plan::TextSeek {
                    field: leaf.field,
                    query: leaf.value.clone(),
                    mode,
                };
            }
        }

        if self.value_index_ranges {
            if let Some(plan) = range_plan(rule, now) {
                return plan;
            }
        }

        Plan::Scan
    }
}

fn range_plan(rule: &Rule, now: DateTime<Utc>) -> Option<Plan> {
    let (field, range) = match rule {
        Rule::NumericMetadata(leaf) if !leaf.negated => (
            leaf.field,
            ValueRange::Number(number_bounds(leaf.operator, leaf.value, leaf.second_value)?),
        ),
        Rule::PlayStatistics(leaf) if !leaf.negated && leaf.field == Field::LastPlayed => (
            leaf.field,
            ValueRange::Date(date_bounds(leaf.operator, leaf.date_value?, leaf.second_date_value, now)?),
        ),
        Rule::PlayStatistics(leaf) if !leaf.negated => (
            leaf.field,
            ValueRange::Number(number_bounds(
                leaf.operator,
                leaf.numeric_value?,
                leaf.second_numeric_value,
            )?),
        ),
        Rule::FileProperty(leaf) if !leaf.negated && leaf.field == Field::DateAdded => (
            leaf.field,
            ValueRange::Date(date_bounds(leaf.operator, leaf.date_value?, leaf.second_date_value, now)?),
        ),
        _ => return None,
    };

    if !IndexSet::is_value_indexed(field) {
        return None;
    }
    Some(Plan::ValueRange { field, range })
}

fn number_bounds(operator: Operator, value: f64, second: Option<f64>) -> Option<Bounds<f64>> {
    let bounds = match operator {
        Operator::GreaterThan => Bounds { lower: Some((value, false)), upper: None },
        Operator::GreaterThanOrEqual => Bounds { lower: Some((value, true)), upper: None },
        Operator::LessThan => Bounds { lower: None, upper: Some((value, false)) },
        Operator::LessThanOrEqual => Bounds { lower: None, upper: Some((value, true)) },
        // Same bound ordering as the matcher, including its NaN handling
        Operator::Between => {
            let other = second?;
            Bounds {
                lower: Some((value.min(other), true)),
                upper: Some((value.max(other), true)),
            }
        }
        _ => return None,
    };
    Some(bounds)
}

fn date_bounds(
    operator: Operator,
    value: DateOperand,
    second: Option<DateOperand>,
    now: DateTime<Utc>,
) -> Option<Bounds<DateTime<Utc>>> {
    let value = value.resolve(now);
    let bounds = match operator {
        Operator::GreaterThan => Bounds { lower: Some((value, false)), upper: None },
        Operator::GreaterThanOrEqual => Bounds { lower: Some((value, true)), upper: None },
        Operator::LessThan => Bounds { lower: None, upper: Some((value, false)) },
        Operator::LessThanOrEqual => Bounds { lower: None, upper: Some((value, true)) },
        Operator::Between => {
            let other = second?.resolve(now);
            Bounds {
                lower: Some((value.min(other), true)),
                upper: Some((value.max(other), true)),
            }
        }
        _ => return None,
    };
    Some(bounds)
}
