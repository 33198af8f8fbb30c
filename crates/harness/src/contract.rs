//! Negative-path contracts: validation failures, not-found bodies, ticket math

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use std::fmt;

use crate::client::ApiResponse;
use crate::error::{HarnessError, HarnessResult};
use crate::model::{Donation, Prize};

/// Status the service answers validation failures with (not 400/422)
pub const VALIDATION_STATUS: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;

/// Suffix of every not-found error body
pub const NOT_FOUND_SUFFIX: &str = "item not found";

static VALIDATION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Key: '(\w+)\.(\w+)' Error:Field validation for '(\w+)' failed on the '(\w+)' tag")
        .expect("validation line pattern is valid")
});

/// One `field:rule` failure descriptor reported by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub request: String,
    pub field: String,
    pub rule: String,
}

impl ValidationFailure {
    pub fn new(request: &str, field: &str, rule: &str) -> Self {
        Self {
            request: request.to_string(),
            field: field.to_string(),
            rule: rule.to_string(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Key: '{}.{}' Error:Field validation for '{}' failed on the '{}' tag",
            self.request, self.field, self.field, self.rule
        )
    }
}

/// Render failures the way the service joins them
pub fn render_failures(failures: &[ValidationFailure]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
}

/// Recover every failure descriptor present in an error body, in order
pub fn parse_validation_failures(body: &str) -> Vec<ValidationFailure> {
    VALIDATION_LINE
        .captures_iter(body)
        .map(|caps| ValidationFailure {
            request: caps[1].to_string(),
            field: caps[2].to_string(),
            rule: caps[4].to_string(),
        })
        .collect()
}

/// Assert the service rejected the request with exactly these failure lines
/// appearing together, in this order
pub fn expect_validation(
    response: &ApiResponse,
    expected: &[ValidationFailure],
) -> HarnessResult<()> {
    let rendered = render_failures(expected);
    if response.status != VALIDATION_STATUS || !response.contains(&rendered) {
        let observed = parse_validation_failures(&response.body)
            .iter()
            .map(|f| format!("{}:{}", f.field, f.rule))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(HarnessError::Validation {
            expected: format!("{} {}", VALIDATION_STATUS.as_u16(), rendered),
            observed,
            body: format!("{} {}", response.status_code(), response.body),
        });
    }
    Ok(())
}

/// Assert the body reports `<operation>: item not found`
pub fn expect_not_found(response: &ApiResponse, operation: &str) -> HarnessResult<()> {
    let needle = format!("{operation}: {NOT_FOUND_SUFFIX}");
    if response.status.is_success() || !response.contains(&needle) {
        return Err(HarnessError::NotFound {
            operation: operation.to_string(),
            body: format!("{} {}", response.status_code(), response.body),
        });
    }
    Ok(())
}

/// Tickets a donation of `amount` buys at `unit_cost` per ticket
pub fn expected_tickets(amount: i64, unit_cost: i64) -> i64 {
    if unit_cost <= 0 {
        return 0;
    }
    amount / unit_cost
}

/// The echoed ticket count must equal the locally recomputed one
pub fn expect_ticket_count(donation: &Donation, prize: &Prize) -> HarnessResult<()> {
    let expected = expected_tickets(donation.amount, prize.ticket_cost);
    if donation.tickets_number != expected {
        return Err(HarnessError::Assertion(format!(
            "donation {} of {} at ticket cost {} reports {} tickets, expected {}",
            donation.id, donation.amount, prize.ticket_cost, donation.tickets_number, expected
        )));
    }
    Ok(())
}
