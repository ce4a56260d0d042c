use serde::{Deserialize, Serialize};
use crate::core::error::{Error, Result};
use crate::core::types::Field;
use crate::index::field_indexes::IndexSet;
use crate::query::types::{Combinator, DateOperand, Operator};

/// Fields addressable by `StringMetadataRule`
pub const STRING_METADATA_FIELDS: [Field; 4] = [Field::Title, Field::Artist, Field::Album, Field::Genre];

/// Fields addressable by `NumericMetadataRule`
pub const NUMERIC_METADATA_FIELDS: [Field; 5] = [
    Field::Year,
    Field::Duration,
    Field::PlayCount,
    Field::Bpm,
    Field::Rating,
];

pub const PLAY_STATISTICS_FIELDS: [Field; 3] = [Field::PlayCount, Field::LastPlayed, Field::Rating];

pub const FILE_PROPERTY_FIELDS: [Field; 2] = [Field::DateAdded, Field::Format];

/// Predicate tree over track fields.
///
/// Leaves compare one field; `Combined` joins children with AND/OR. There is
/// no NOT node: negation is a flag on each leaf, and `Rule::negate` pushes it
/// down through composites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Rule {
    StringMetadata(StringMetadataRule),
    NumericMetadata(NumericMetadataRule),
    PlayStatistics(PlayStatisticsRule),
    FileProperty(FilePropertyRule),
    Combined(CombinedRule),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringMetadataRule {
    pub field: Field,
    pub operator: Operator,
    pub value: String,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericMetadataRule {
    pub field: Field,
    pub operator: Operator,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_value: Option<f64>,  // Upper bound for `between`
    #[serde(default)]
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayStatisticsRule {
    pub field: Field,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_numeric_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_value: Option<DateOperand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_date_value: Option<DateOperand>,
    #[serde(default)]
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePropertyRule {
    pub field: Field,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_value: Option<DateOperand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_date_value: Option<DateOperand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_value: Option<Vec<String>>,
    #[serde(default)]
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedRule {
    pub operator: Combinator,
    pub children: Vec<Rule>,
}

fn check_field(family: &str, field: Field, allowed: &[Field]) -> Result<()> {
    if allowed.contains(&field) {
        Ok(())
    } else {
        Err(Error::invalid_field(format!(
            "{} rules cannot address field {}",
            family,
            field.name()
        )))
    }
}

fn check_operator(field: Field, operator: Operator, allowed: &[Operator]) -> Result<()> {
    if allowed.contains(&operator) {
        Ok(())
    } else {
        Err(Error::invalid_operator(format!(
            "operator {:?} is not valid for field {}",
            operator,
            field.name()
        )))
    }
}

fn require<T>(field: Field, what: &str, value: &Option<T>) -> Result<()> {
    if value.is_some() {
        Ok(())
    } else {
        Err(Error::missing_operand(format!("{} rule needs a {}", field.name(), what)))
    }
}

impl StringMetadataRule {
    pub fn new(
        field: Field,
        operator: Operator,
        value: impl Into<String>,
        case_sensitive: bool,
    ) -> Result<Self> {
        let rule = StringMetadataRule {
            field,
            operator,
            value: value.into(),
            case_sensitive,
            negated: false,
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn validate(&self) -> Result<()> {
        check_field("string metadata", self.field, &STRING_METADATA_FIELDS)?;
        check_operator(self.field, self.operator, &Operator::TEXT)
    }

    /// Answerable by a text index lookup alone
    pub fn requires_indexing(&self) -> bool {
        !self.negated
            && !self.case_sensitive
            && matches!(self.operator, Operator::Contains | Operator::StartsWith)
            && IndexSet::is_text_indexed(self.field)
    }
}

impl NumericMetadataRule {
    pub fn new(field: Field, operator: Operator, value: f64) -> Result<Self> {
        let rule = NumericMetadataRule {
            field,
            operator,
            value,
            second_value: None,
            negated: false,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Inclusive on both ends, in either order
    pub fn between(field: Field, low: f64, high: f64) -> Result<Self> {
        let rule = NumericMetadataRule {
            field,
            operator: Operator::Between,
            value: low,
            second_value: Some(high),
            negated: false,
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn validate(&self) -> Result<()> {
        check_field("numeric metadata", self.field, &NUMERIC_METADATA_FIELDS)?;
        check_operator(self.field, self.operator, &Operator::ORDERED)?;
        if self.operator == Operator::Between {
            require(self.field, "second value for between", &self.second_value)?;
        }
        Ok(())
    }
}

impl PlayStatisticsRule {
    fn empty(field: Field, operator: Operator) -> Self {
        PlayStatisticsRule {
            field,
            operator,
            numeric_value: None,
            second_numeric_value: None,
            date_value: None,
            second_date_value: None,
            negated: false,
        }
    }

    /// Play count or rating comparison
    pub fn count(field: Field, operator: Operator, value: f64) -> Result<Self> {
        let rule = PlayStatisticsRule {
            numeric_value: Some(value),
            ..Self::empty(field, operator)
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn count_between(field: Field, low: f64, high: f64) -> Result<Self> {
        let rule = PlayStatisticsRule {
            numeric_value: Some(low),
            second_numeric_value: Some(high),
            ..Self::empty(field, Operator::Between)
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn last_played(operator: Operator, value: DateOperand) -> Result<Self> {
        let rule = PlayStatisticsRule {
            date_value: Some(value),
            ..Self::empty(Field::LastPlayed, operator)
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn last_played_between(from: DateOperand, to: DateOperand) -> Result<Self> {
        let rule = PlayStatisticsRule {
            date_value: Some(from),
            second_date_value: Some(to),
            ..Self::empty(Field::LastPlayed, Operator::Between)
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn validate(&self) -> Result<()> {
        check_field("play statistics", self.field, &PLAY_STATISTICS_FIELDS)?;
        check_operator(self.field, self.operator, &Operator::ORDERED)?;
        let between = self.operator == Operator::Between;
        if self.field == Field::LastPlayed {
            require(self.field, "date value", &self.date_value)?;
            if between {
                require(self.field, "second date for between", &self.second_date_value)?;
            }
        } else {
            require(self.field, "numeric value", &self.numeric_value)?;
            if between {
                require(self.field, "second value for between", &self.second_numeric_value)?;
            }
        }
        Ok(())
    }
}

impl FilePropertyRule {
    fn empty(field: Field, operator: Operator) -> Self {
        FilePropertyRule {
            field,
            operator,
            date_value: None,
            second_date_value: None,
            list_value: None,
            negated: false,
        }
    }

    pub fn date_added(operator: Operator, value: DateOperand) -> Result<Self> {
        let rule = FilePropertyRule {
            date_value: Some(value),
            ..Self::empty(Field::DateAdded, operator)
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn date_added_between(from: DateOperand, to: DateOperand) -> Result<Self> {
        let rule = FilePropertyRule {
            date_value: Some(from),
            second_date_value: Some(to),
            ..Self::empty(Field::DateAdded, Operator::Between)
        };
        rule.validate()?;
        Ok(rule)
    }

    /// `equals` / `notEquals` against one format name
    pub fn format(operator: Operator, value: impl Into<String>) -> Result<Self> {
        let rule = FilePropertyRule {
            list_value: Some(vec![value.into()]),
            ..Self::empty(Field::Format, operator)
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn format_in<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rule = FilePropertyRule {
            list_value: Some(values.into_iter().map(Into::into).collect()),
            ..Self::empty(Field::Format, Operator::InList)
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn validate(&self) -> Result<()> {
        check_field("file property", self.field, &FILE_PROPERTY_FIELDS)?;
        if self.field == Field::Format {
            check_operator(self.field, self.operator, &Operator::FORMAT)?;
            match &self.list_value {
                Some(list) if !list.is_empty() => Ok(()),
                _ => Err(Error::missing_operand("format rule needs at least one format")),
            }
        } else {
            check_operator(self.field, self.operator, &Operator::ORDERED)?;
            require(self.field, "date value", &self.date_value)?;
            if self.operator == Operator::Between {
                require(self.field, "second date for between", &self.second_date_value)?;
            }
            Ok(())
        }
    }
}

impl Rule {
    pub fn and(children: Vec<Rule>) -> Rule {
        Rule::Combined(CombinedRule {
            operator: Combinator::And,
            children,
        })
    }

    pub fn or(children: Vec<Rule>) -> Rule {
        Rule::Combined(CombinedRule {
            operator: Combinator::Or,
            children,
        })
    }

    /// Re-check every leaf. Constructors already do this; rules that arrive
    /// through serde must be validated before use.
    pub fn validate(&self) -> Result<()> {
        match self {
            Rule::StringMetadata(rule) => rule.validate(),
            Rule::NumericMetadata(rule) => rule.validate(),
            Rule::PlayStatistics(rule) => rule.validate(),
            Rule::FileProperty(rule) => rule.validate(),
            Rule::Combined(rule) => rule.children.iter().try_for_each(Rule::validate),
        }
    }

    /// Logical complement. Leaves flip their flag; composites apply
    /// De Morgan so negation always ends up on the leaves.
    pub fn negate(self) -> Rule {
        match self {
            Rule::StringMetadata(mut rule) => {
                rule.negated = !rule.negated;
                Rule::StringMetadata(rule)
            }
            Rule::NumericMetadata(mut rule) => {
                rule.negated = !rule.negated;
                Rule::NumericMetadata(rule)
            }
            Rule::PlayStatistics(mut rule) => {
                rule.negated = !rule.negated;
                Rule::PlayStatistics(rule)
            }
            Rule::FileProperty(mut rule) => {
                rule.negated = !rule.negated;
                Rule::FileProperty(rule)
            }
            Rule::Combined(rule) => Rule::Combined(CombinedRule {
                operator: match rule.operator {
                    Combinator::And => Combinator::Or,
                    Combinator::Or => Combinator::And,
                },
                children: rule.children.into_iter().map(Rule::negate).collect(),
            }),
        }
    }

    /// True only for a lone text leaf an index can answer completely
    pub fn requires_indexing(&self) -> bool {
        match self {
            Rule::StringMetadata(rule) => rule.requires_indexing(),
            Rule::NumericMetadata(_)
            | Rule::PlayStatistics(_)
            | Rule::FileProperty(_)
            | Rule::Combined(_) => false,
        }
    }

    /// Whether the outcome depends on the evaluation clock
    pub fn has_relative_dates(&self) -> bool {
        let relative = |value: &Option<DateOperand>| value.is_some_and(|d| d.is_relative());
        match self {
            Rule::PlayStatistics(rule) => {
                relative(&rule.date_value) || relative(&rule.second_date_value)
            }
            Rule::FileProperty(rule) => {
                relative(&rule.date_value) || relative(&rule.second_date_value)
            }
            Rule::Combined(rule) => rule.children.iter().any(Rule::has_relative_dates),
            Rule::StringMetadata(_) | Rule::NumericMetadata(_) => false,
        }
    }

    /// Whether any numeric operand is NaN or infinite (JSON writes these as `null`)
    pub fn has_non_finite_operands(&self) -> bool {
        let non_finite = |value: Option<f64>| value.is_some_and(|v| !v.is_finite());
        match self {
            Rule::NumericMetadata(rule) => non_finite(Some(rule.value)) || non_finite(rule.second_value),
            Rule::PlayStatistics(rule) => {
                non_finite(rule.numeric_value) || non_finite(rule.second_numeric_value)
            }
            Rule::Combined(rule) => rule.children.iter().any(Rule::has_non_finite_operands),
            Rule::StringMetadata(_) | Rule::FileProperty(_) => false,
        }
    }
}

impl From<StringMetadataRule> for Rule {
    fn from(rule: StringMetadataRule) -> Self {
        Rule::StringMetadata(rule)
    }
}

impl From<NumericMetadataRule> for Rule {
    fn from(rule: NumericMetadataRule) -> Self {
        Rule::NumericMetadata(rule)
    }
}

impl From<PlayStatisticsRule> for Rule {
    fn from(rule: PlayStatisticsRule) -> Self {
        Rule::PlayStatistics(rule)
    }
}

impl From<FilePropertyRule> for Rule {
    fn from(rule: FilePropertyRule) -> Self {
        Rule::FileProperty(rule)
    }
}

impl From<CombinedRule> for Rule {
    fn from(rule: CombinedRule) -> Self {
        Rule::Combined(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::query::types::TimeUnit;

    #[test]
    fn contains_on_numeric_field_is_rejected() {
        let err = StringMetadataRule::new(Field::Year, Operator::Contains, "19", false).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidField);

        let err = NumericMetadataRule::new(Field::Year, Operator::Contains, 1999.0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOperator);
    }

    #[test]
    fn between_needs_second_value() {
        let rule = NumericMetadataRule {
            field: Field::Bpm,
            operator: Operator::Between,
            value: 120.0,
            second_value: None,
            negated: false,
        };
        assert_eq!(rule.validate().unwrap_err().kind, ErrorKind::MissingOperand);
        assert!(NumericMetadataRule::between(Field::Bpm, 120.0, 130.0).is_ok());
    }

    #[test]
    fn play_statistics_operand_must_match_field() {
        let rule = PlayStatisticsRule {
            numeric_value: Some(3.0),
            ..PlayStatisticsRule::empty(Field::LastPlayed, Operator::GreaterThan)
        };
        assert_eq!(rule.validate().unwrap_err().kind, ErrorKind::MissingOperand);

        let err = PlayStatisticsRule::count(Field::Year, Operator::Equals, 1.0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidField);

        assert!(PlayStatisticsRule::last_played(Operator::GreaterThan, DateOperand::ago(7, TimeUnit::Days)).is_ok());
    }

    #[test]
    fn format_rules() {
        assert!(FilePropertyRule::format_in(["flac", "mp3"]).is_ok());
        let empty: Vec<String> = Vec::new();
        assert_eq!(FilePropertyRule::format_in(empty).unwrap_err().kind, ErrorKind::MissingOperand);
        let err = FilePropertyRule::format(Operator::Contains, "fl").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOperator);
    }

    #[test]
    fn negate_pushes_down_through_composites() {
        let a: Rule = StringMetadataRule::new(Field::Artist, Operator::Contains, "a", false).unwrap().into();
        let b: Rule = NumericMetadataRule::new(Field::Year, Operator::LessThan, 2000.0).unwrap().into();
        let negated = Rule::and(vec![a.clone(), b.clone()]).negate();

        match negated {
            Rule::Combined(CombinedRule { operator, children }) => {
                assert_eq!(operator, Combinator::Or);
                assert_eq!(children, vec![a.clone().negate(), b.clone().negate()]);
            }
            other => panic!("expected combined rule, got {:?}", other),
        }
        assert_eq!(a.clone().negate().negate(), a);
    }

    #[test]
    fn only_plain_text_leaves_are_indexable() {
        let leaf = StringMetadataRule::new(Field::Artist, Operator::Contains, "que", false).unwrap();
        assert!(Rule::from(leaf.clone()).requires_indexing());
        assert!(!Rule::from(leaf.clone()).negate().requires_indexing());

        let title = StringMetadataRule::new(Field::Title, Operator::Contains, "que", false).unwrap();
        assert!(!Rule::from(title).requires_indexing());

        let sensitive = StringMetadataRule::new(Field::Artist, Operator::StartsWith, "Q", true).unwrap();
        assert!(!Rule::from(sensitive).requires_indexing());

        assert!(!Rule::and(vec![leaf.into()]).requires_indexing());
    }

    #[test]
    fn serde_round_trip_keeps_shape() {
        let rule = Rule::or(vec![
            StringMetadataRule::new(Field::Genre, Operator::Equals, "Jazz", false).unwrap().into(),
            PlayStatisticsRule::last_played(Operator::GreaterThan, DateOperand::ago(2, TimeUnit::Weeks))
                .unwrap()
                .into(),
        ]);
        let json = serde_json::to_string(&rule).unwrap();
        assert!(json.contains("\"type\":\"combined\""));
        let back: Rule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
        assert!(back.has_relative_dates());
    }
}
