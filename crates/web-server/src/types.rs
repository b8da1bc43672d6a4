// In crates/web-server/src/types.rs

use crate::error::{Error, Result};
use core_types::{Credentials, ProgramType};
use engine::EvaluationRequest;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Body of `POST /api/accounts/metrics`.
///
/// Every field is optional at the serde level so a missing one becomes a 400 with a
/// readable message instead of a generic extractor rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsRequestBody {
    pub account_id: Option<String>,
    pub token: Option<String>,
    pub program_type: Option<String>,
    pub starting_balance: Option<Decimal>,
    pub admin_override: bool,
}

impl MetricsRequestBody {
    pub fn into_request(self) -> Result<EvaluationRequest> {
        let account_id = required(self.account_id, "accountId")?;
        let token = required(self.token, "token")?;
        let program_type: ProgramType = required(self.program_type, "programType")?
            .parse()
            .map_err(|e: core_types::Error| Error::BadRequest(e.to_string()))?;
        let starting_balance = self
            .starting_balance
            .filter(|b| *b > Decimal::ZERO)
            .ok_or_else(|| Error::BadRequest("startingBalance must be a positive number".into()))?;

        Ok(EvaluationRequest::new(
            Credentials::new(account_id, token),
            program_type,
            starting_balance,
            self.admin_override,
        ))
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(Error::BadRequest(format!("{field} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: serde_json::Value) -> MetricsRequestBody {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn complete_body_becomes_a_request() {
        let request = body(json!({
            "accountId": " acc-1 ",
            "token": "tok",
            "programType": "Instant",
            "startingBalance": 50000
        }))
        .into_request()
        .unwrap();

        assert_eq!(request.credentials.account_id, "acc-1");
        assert_eq!(request.program_type, ProgramType::Instant);
        assert_eq!(request.starting_balance, Decimal::from(50000));
        assert!(!request.admin_override);
    }

    #[test]
    fn missing_or_invalid_fields_are_bad_requests() {
        let cases = [
            json!({ "token": "t", "programType": "standard", "startingBalance": 1 }),
            json!({ "accountId": "a", "token": "  ", "programType": "standard", "startingBalance": 1 }),
            json!({ "accountId": "a", "token": "t", "programType": "turbo", "startingBalance": 1 }),
            json!({ "accountId": "a", "token": "t", "programType": "standard", "startingBalance": 0 }),
            json!({ "accountId": "a", "token": "t", "programType": "standard" }),
        ];
        for case in cases {
            let result = body(case.clone()).into_request();
            assert!(matches!(result, Err(Error::BadRequest(_))), "{case}");
        }
    }
}
