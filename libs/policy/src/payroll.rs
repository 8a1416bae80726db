//! Salary after violation deductions

use serde::Serialize;

use crate::models::Violation;
use crate::report::round2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalarySummary {
    pub base_salary: f64,
    /// Sum of violation deduction fractions, capped at 1.0
    pub deduction_rate_total: f64,
    pub deduction_amount: f64,
    pub net_salary: f64,
    pub violations: usize,
}

/// Apply the violations of a period to a base salary
pub fn summarize(salary: f64, violations: &[Violation]) -> SalarySummary {
    let rate: f64 = violations
        .iter()
        .map(|v| v.deduction_amount.max(0.0))
        .sum::<f64>()
        .min(1.0);
    let deduction = salary * rate;

    SalarySummary {
        base_salary: salary,
        deduction_rate_total: (rate * 10_000.0).round() / 10_000.0,
        deduction_amount: round2(deduction),
        net_salary: round2(salary - deduction),
        violations: violations.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ViolationType;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn violation(deduction_amount: f64) -> Violation {
        Violation {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            violation_type: ViolationType::LateArrival,
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            minutes: 60,
            deduction_amount,
            details: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn deductions_reduce_the_base_salary() {
        let summary = summarize(5000.0, &[violation(0.05), violation(0.025)]);
        assert_eq!(summary.deduction_amount, 375.0);
        assert_eq!(summary.net_salary, 4625.0);
        assert_eq!(summary.violations, 2);
    }

    #[test]
    fn deduction_never_exceeds_the_salary() {
        let summary = summarize(1000.0, &[violation(0.8), violation(0.7)]);
        assert_eq!(summary.deduction_rate_total, 1.0);
        assert_eq!(summary.net_salary, 0.0);
    }

    #[test]
    fn no_violations_no_deduction() {
        let summary = summarize(1234.5, &[]);
        assert_eq!(summary.net_salary, 1234.5);
        assert_eq!(summary.deduction_amount, 0.0);
    }
}
