use crate::leave::error::LeaveError;
use crate::model::leave_type::{ApprovalRule, ApproverStep, LeaveTypeConfig};

/// Picks the rule governing a request of `total_days`.
///
/// The tightest rule whose threshold is strictly above `total_days` wins;
/// a request larger than every bracket falls under the largest one.
pub fn select_rule(rules: &[ApprovalRule], total_days: f64) -> Option<&ApprovalRule> {
    rules
        .iter()
        .filter(|r| f64::from(r.max_days_threshold) > total_days)
        .min_by_key(|r| r.max_days_threshold)
        .or_else(|| rules.iter().max_by_key(|r| r.max_days_threshold))
}

/// Ordered approver chain a request of `total_days` must pass through.
pub fn resolve(config: &LeaveTypeConfig, total_days: f64) -> Result<Vec<ApproverStep>, LeaveError> {
    let chain: Vec<ApproverStep> = match select_rule(&config.approval_rules, total_days) {
        Some(rule) => rule
            .required_steps
            .iter()
            .filter_map(|&i| config.approver_steps.get(i).cloned())
            .collect(),
        None => config.approver_steps.clone(),
    };

    if chain.is_empty() {
        return Err(LeaveError::NoApplicableRule {
            leave_type_id: config.id,
        });
    }
    Ok(chain)
}
