use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Comparison operators; which ones apply depends on the field's kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    StartsWith,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Between,
    InList,
}

impl Operator {
    pub const TEXT: [Operator; 4] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::Contains,
        Operator::StartsWith,
    ];

    pub const ORDERED: [Operator; 7] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThan,
        Operator::LessThanOrEqual,
        Operator::Between,
    ];

    pub const FORMAT: [Operator; 3] = [Operator::Equals, Operator::NotEquals, Operator::InList];

    pub fn is_range(&self) -> bool {
        matches!(
            self,
            Operator::GreaterThan
                | Operator::GreaterThanOrEqual
                | Operator::LessThan
                | Operator::LessThanOrEqual
                | Operator::Between
        )
    }
}

/// Boolean combinator of a composite rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combinator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeUnit {
    Hours,
    Days,
    Weeks,
    Months,  // 30 days
    Years,   // 365 days
}

impl TimeUnit {
    /// `None` when the span exceeds the representable range
    pub fn span(&self, amount: u32) -> Option<Duration> {
        let amount = amount as i64;
        match self {
            TimeUnit::Hours => Duration::try_hours(amount),
            TimeUnit::Days => Duration::try_days(amount),
            TimeUnit::Weeks => Duration::try_weeks(amount),
            TimeUnit::Months => Duration::try_days(amount * 30),
            TimeUnit::Years => Duration::try_days(amount * 365),
        }
    }
}

/// Right-hand side of a date comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DateOperand {
    Absolute { date: DateTime<Utc> },
    /// `amount` units before the evaluation clock
    Relative { amount: u32, unit: TimeUnit },
}

impl DateOperand {
    pub fn at(date: DateTime<Utc>) -> Self {
        DateOperand::Absolute { date }
    }

    pub fn ago(amount: u32, unit: TimeUnit) -> Self {
        DateOperand::Relative { amount, unit }
    }

    pub fn resolve(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            DateOperand::Absolute { date } => *date,
            DateOperand::Relative { amount, unit } => unit
                .span(*amount)
                .and_then(|span| now.checked_sub_signed(span))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, DateOperand::Relative { .. })
    }
}
