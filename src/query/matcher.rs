use chrono::{DateTime, Utc};
use crate::core::types::{Field, Track};
use crate::query::rule::{
    CombinedRule, FilePropertyRule, NumericMetadataRule, PlayStatisticsRule, Rule, StringMetadataRule,
};
use crate::query::types::{Combinator, DateOperand, Operator};

/// Evaluates rules against single tracks.
///
/// Pure: the only ambient input is `now`, fixed when the matcher is built so
/// that relative dates resolve identically for every track of one evaluation.
///
/// Null handling: a leaf on a missing field is false, except `notEquals`,
/// which is true (null is never equal to a concrete value). A negated leaf is
/// the complement of the plain leaf, so it is true on a missing field.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatcher {
    now: DateTime<Utc>,
}

impl RuleMatcher {
    pub fn new(now: DateTime<Utc>) -> Self {
        RuleMatcher { now }
    }

    /// Matcher on the current wall clock
    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    pub fn clock(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn matches(&self, rule: &Rule, track: &Track) -> bool {
        match rule {
            Rule::StringMetadata(rule) => rule.negated ^ self.matches_string(rule, track),
            Rule::NumericMetadata(rule) => rule.negated ^ self.matches_numeric(rule, track),
            Rule::PlayStatistics(rule) => rule.negated ^ self.matches_play_statistics(rule, track),
            Rule::FileProperty(rule) => rule.negated ^ self.matches_file_property(rule, track),
            Rule::Combined(rule) => self.matches_combined(rule, track),
        }
    }

    fn matches_combined(&self, rule: &CombinedRule, track: &Track) -> bool {
        // Iterator::all / any stop at the first deciding child
        match rule.operator {
            Combinator::And => rule.children.iter().all(|child| self.matches(child, track)),
            Combinator::Or => rule.children.iter().any(|child| self.matches(child, track)),
        }
    }

    fn matches_string(&self, rule: &StringMetadataRule, track: &Track) -> bool {
        let Some(value) = track.text(rule.field) else {
            return rule.operator == Operator::NotEquals;
        };

        if rule.case_sensitive {
            compare_text(value, &rule.value, rule.operator)
        } else {
            compare_text(&value.to_lowercase(), &rule.value.to_lowercase(), rule.operator)
        }
    }

    fn matches_numeric(&self, rule: &NumericMetadataRule, track: &Track) -> bool {
        match track.number(rule.field) {
            Some(value) => compare_number(value, rule.operator, rule.value, rule.second_value),
            None => rule.operator == Operator::NotEquals,
        }
    }

    fn matches_play_statistics(&self, rule: &PlayStatisticsRule, track: &Track) -> bool {
        if rule.field == Field::LastPlayed {
            self.matches_date(track.date(rule.field), rule.operator, rule.date_value, rule.second_date_value)
        } else {
            match (track.number(rule.field), rule.numeric_value) {
                (Some(value), Some(operand)) => {
                    compare_number(value, rule.operator, operand, rule.second_numeric_value)
                }
                (None, _) => rule.operator == Operator::NotEquals,
                (Some(_), None) => false,
            }
        }
    }

    fn matches_file_property(&self, rule: &FilePropertyRule, track: &Track) -> bool {
        if rule.field == Field::Format {
            let Some(format) = track.text(Field::Format) else {
                return rule.operator == Operator::NotEquals;
            };
            let list = rule.list_value.as_deref().unwrap_or_default();
            let format = format.to_lowercase();
            let same = |candidate: &String| candidate.to_lowercase() == format;
            match rule.operator {
                Operator::Equals => list.first().is_some_and(same),
                Operator::NotEquals => !list.first().is_some_and(same),
                Operator::InList => list.iter().any(same),
                _ => false,
            }
        } else {
            self.matches_date(track.date(rule.field), rule.operator, rule.date_value, rule.second_date_value)
        }
    }

    fn matches_date(
        &self,
        value: Option<DateTime<Utc>>,
        operator: Operator,
        operand: Option<DateOperand>,
        second: Option<DateOperand>,
    ) -> bool {
        let Some(value) = value else {
            return operator == Operator::NotEquals;
        };
        let Some(operand) = operand.map(|d| d.resolve(self.now)) else {
            return false;
        };

        match operator {
            // Calendar-day equality
            Operator::Equals => value.date_naive() == operand.date_naive(),
            Operator::NotEquals => value.date_naive() != operand.date_naive(),
            Operator::GreaterThan => value > operand,
            Operator::GreaterThanOrEqual => value >= operand,
            Operator::LessThan => value < operand,
            Operator::LessThanOrEqual => value <= operand,
            Operator::Between => match second.map(|d| d.resolve(self.now)) {
                Some(other) => {
                    let (low, high) = if operand <= other { (operand, other) } else { (other, operand) };
                    value >= low && value <= high
                }
                None => false,
            },
            Operator::Contains | Operator::StartsWith | Operator::InList => false,
        }
    }
}

impl Default for RuleMatcher {
    fn default() -> Self {
        Self::now()
    }
}

fn compare_text(value: &str, operand: &str, operator: Operator) -> bool {
    match operator {
        Operator::Equals => value == operand,
        Operator::NotEquals => value != operand,
        Operator::Contains => value.contains(operand),
        Operator::StartsWith => value.starts_with(operand),
        _ => false,
    }
}

fn compare_number(value: f64, operator: Operator, operand: f64, second: Option<f64>) -> bool {
    match operator {
        Operator::Equals => value == operand,
        Operator::NotEquals => value != operand,
        Operator::GreaterThan => value > operand,
        Operator::GreaterThanOrEqual => value >= operand,
        Operator::LessThan => value < operand,
        Operator::LessThanOrEqual => value <= operand,
        Operator::Between => match second {
            Some(other) => value >= operand.min(other) && value <= operand.max(other),
            None => false,
        },
        Operator::Contains | Operator::StartsWith | Operator::InList => false,
    }
}

/// One-shot evaluation on the wall clock
pub fn evaluate(rule: &Rule, track: &Track) -> bool {
    RuleMatcher::now().matches(rule, track)
}
