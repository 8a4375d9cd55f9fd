use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::leave::error::LeaveError;

/// How the days of a leave block are counted against credit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CountingPolicy {
    /// Every calendar day counts, weekends and holidays included.
    LiteralCalendarDays,
    /// Only working days count; boundary days may be halves.
    WorkingDaysOnly,
}

/// One slot in an approval sequence.
///
/// Satisfied by anyone holding one of `acceptable_positions`, or by one of
/// the employees listed in `approver_ids`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct ApproverStep {
    #[serde(default)]
    #[schema(example = json!(["Head of Department"]))]
    pub acceptable_positions: BTreeSet<String>,
    #[serde(default)]
    #[schema(example = json!([]))]
    pub approver_ids: BTreeSet<u64>,
}

impl ApproverStep {
    pub fn positions<I, S>(positions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            acceptable_positions: positions.into_iter().map(Into::into).collect(),
            approver_ids: BTreeSet::new(),
        }
    }

    pub fn identities<I: IntoIterator<Item = u64>>(ids: I) -> Self {
        Self {
            acceptable_positions: BTreeSet::new(),
            approver_ids: ids.into_iter().collect(),
        }
    }

    pub fn is_satisfied_by(&self, employee_id: u64, position: Option<&str>) -> bool {
        self.approver_ids.contains(&employee_id)
            || position.is_some_and(|p| self.acceptable_positions.contains(p))
    }

    fn is_empty(&self) -> bool {
        self.acceptable_positions.is_empty() && self.approver_ids.is_empty()
    }
}

/// Maps requests shorter than `max_days_threshold` to a subset of steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ApprovalRule {
    #[schema(example = 7)]
    pub max_days_threshold: u32,
    /// Indices into `LeaveTypeConfig::approver_steps`, ascending.
    #[schema(example = json!([0]))]
    pub required_steps: Vec<usize>,
}

/// Wire shapes accepted for a rule. `approval_level: n` is shorthand for
/// the first `n` configured steps.
#[derive(Deserialize)]
#[serde(untagged)]
enum ApprovalRuleInput {
    Steps {
        max_days_threshold: u32,
        required_steps: Vec<usize>,
    },
    Level {
        max_days_threshold: u32,
        approval_level: usize,
    },
}

impl<'de> Deserialize<'de> for ApprovalRule {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match ApprovalRuleInput::deserialize(deserializer)? {
            ApprovalRuleInput::Steps {
                max_days_threshold,
                required_steps,
            } => ApprovalRule {
                max_days_threshold,
                required_steps,
            },
            ApprovalRuleInput::Level {
                max_days_threshold,
                approval_level,
            } => ApprovalRule::with_level(max_days_threshold, approval_level),
        })
    }
}

impl ApprovalRule {
    pub fn new(max_days_threshold: u32, required_steps: Vec<usize>) -> Self {
        Self {
            max_days_threshold,
            required_steps,
        }
    }

    pub fn with_level(max_days_threshold: u32, approval_level: usize) -> Self {
        Self::new(max_days_threshold, (0..approval_level).collect())
    }
}

#[derive(Deserialize)]
struct LeaveTypeConfigInput {
    id: u64,
    name: String,
    #[serde(default)]
    max_days: u32,
    counting_policy: CountingPolicy,
    #[serde(default)]
    approver_steps: Vec<ApproverStep>,
    #[serde(default)]
    approval_rules: Vec<ApprovalRule>,
}

/// Administrator-managed settings of one leave type. Only constructible
/// through validation, so the engine can trust its invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LeaveTypeConfigInput")]
pub struct LeaveTypeConfig {
    pub id: u64,
    pub name: String,
    /// Upper bound on one request; 0 means unbounded.
    pub max_days: u32,
    pub counting_policy: CountingPolicy,
    pub approver_steps: Vec<ApproverStep>,
    pub approval_rules: Vec<ApprovalRule>,
}

impl TryFrom<LeaveTypeConfigInput> for LeaveTypeConfig {
    type Error = LeaveError;

    fn try_from(input: LeaveTypeConfigInput) -> Result<Self, Self::Error> {
        LeaveTypeConfig::new(
            input.id,
            input.name,
            input.max_days,
            input.counting_policy,
            input.approver_steps,
            input.approval_rules,
        )
    }
}

impl LeaveTypeConfig {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        max_days: u32,
        counting_policy: CountingPolicy,
        approver_steps: Vec<ApproverStep>,
        approval_rules: Vec<ApprovalRule>,
    ) -> Result<Self, LeaveError> {
        let config = Self {
            id,
            name: name.into(),
            max_days,
            counting_policy,
            approver_steps,
            approval_rules,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), LeaveError> {
        let invalid = |msg: String| {
            Err(LeaveError::InvalidConfig(format!(
                "leave type {}: {}",
                self.id, msg
            )))
        };

        if let Some(i) = self.approver_steps.iter().position(ApproverStep::is_empty) {
            return invalid(format!("approver step {i} names no position and no approver"));
        }

        let mut previous: Option<&ApprovalRule> = None;
        for rule in &self.approval_rules {
            if rule.max_days_threshold == 0 {
                return invalid("threshold must be greater than zero".into());
            }
            if rule.required_steps.is_empty() {
                return invalid(format!(
                    "rule below {} days requires no step",
                    rule.max_days_threshold
                ));
            }
            if rule.required_steps.windows(2).any(|w| w[0] >= w[1]) {
                return invalid(format!(
                    "rule below {} days lists steps out of order",
                    rule.max_days_threshold
                ));
            }
            if let Some(&step) = rule
                .required_steps
                .iter()
                .find(|&&s| s >= self.approver_steps.len())
            {
                return invalid(format!(
                    "rule below {} days refers to missing step {}",
                    rule.max_days_threshold, step
                ));
            }
            if let Some(prev) = previous {
                if rule.max_days_threshold <= prev.max_days_threshold {
                    return invalid(format!(
                        "thresholds must be strictly increasing ({} after {})",
                        rule.max_days_threshold, prev.max_days_threshold
                    ));
                }
                if rule.required_steps.len() < prev.required_steps.len() {
                    return invalid(format!(
                        "rule below {} days requires fewer steps than the rule before it",
                        rule.max_days_threshold
                    ));
                }
            }
            previous = Some(rule);
        }
        Ok(())
    }
}
