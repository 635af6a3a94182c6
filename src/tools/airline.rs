//! Airline customer-service tools.
//!
//! These are canned demo implementations: lookups return fixed text and the
//! mutating tools only touch the conversation context.

use crate::agents::AirlineAgentContext;
use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Tool that asks the UI to open the interactive seat selector.
pub const SEAT_MAP_TOOL: &str = "display_seat_map";

/// Token the UI interprets as "render the seat map widget".
pub const SEAT_MAP_DIRECTIVE: &str = "DISPLAY_SEAT_MAP";

pub fn all_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(FaqLookupTool),
        Arc::new(UpdateSeatTool),
        Arc::new(FlightStatusTool),
        Arc::new(BaggageTool),
        Arc::new(DisplaySeatMapTool),
        Arc::new(CancelFlightTool),
    ]
}

fn required_str<'a>(args: &'a Value, field: &str) -> Result<&'a str> {
    args.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::InvalidInput(format!("Missing string argument '{}'", field)))
}

fn string_params(fields: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = fields
        .iter()
        .map(|f| (f.to_string(), json!({ "type": "string" })))
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": fields,
    })
}

pub struct FaqLookupTool;

#[async_trait]
impl Tool for FaqLookupTool {
    fn name(&self) -> &str {
        "faq_lookup_tool"
    }

    fn description(&self) -> &str {
        "Lookup frequently asked questions."
    }

    fn parameters_schema(&self) -> Value {
        string_params(&["question"])
    }

    async fn execute(&self, args: Value, _context: &mut AirlineAgentContext) -> Result<Value> {
        let q = required_str(&args, "question")?.to_lowercase();
        let answer = if q.contains("bag") || q.contains("baggage") {
            "You are allowed to bring one bag on the plane. \
             It must be under 50 pounds and 22 inches x 14 inches x 9 inches."
        } else if q.contains("seats") || q.contains("plane") {
            "There are 120 seats on the plane. \
             There are 22 business class seats and 98 economy seats. \
             Exit rows are rows 4 and 16. \
             Rows 5-8 are Economy Plus, with extra legroom."
        } else if q.contains("wifi") {
            "We have free wifi on the plane, join Airline-Wifi"
        } else {
            "I'm sorry, I don't know the answer to that question."
        };
        Ok(Value::String(answer.to_string()))
    }
}

pub struct UpdateSeatTool;

#[async_trait]
impl Tool for UpdateSeatTool {
    fn name(&self) -> &str {
        "update_seat"
    }

    fn description(&self) -> &str {
        "Update the seat for a given confirmation number."
    }

    fn parameters_schema(&self) -> Value {
        string_params(&["confirmation_number", "new_seat"])
    }

    async fn execute(&self, args: Value, context: &mut AirlineAgentContext) -> Result<Value> {
        let confirmation = required_str(&args, "confirmation_number")?;
        let seat = required_str(&args, "new_seat")?;
        if context.flight_number.is_none() {
            return Err(AppError::InvalidInput("Flight number is required".into()));
        }
        context.confirmation_number = Some(confirmation.to_string());
        context.seat_number = Some(seat.to_string());
        Ok(Value::String(format!(
            "Updated seat to {} for confirmation number {}",
            seat, confirmation
        )))
    }
}

pub struct FlightStatusTool;

#[async_trait]
impl Tool for FlightStatusTool {
    fn name(&self) -> &str {
        "flight_status_tool"
    }

    fn description(&self) -> &str {
        "Lookup status for a flight."
    }

    fn parameters_schema(&self) -> Value {
        string_params(&["flight_number"])
    }

    async fn execute(&self, args: Value, _context: &mut AirlineAgentContext) -> Result<Value> {
        let flight = required_str(&args, "flight_number")?;
        Ok(Value::String(format!(
            "Flight {} is on time and scheduled to depart at gate A10.",
            flight
        )))
    }
}

pub struct BaggageTool;

#[async_trait]
impl Tool for BaggageTool {
    fn name(&self) -> &str {
        "baggage_tool"
    }

    fn description(&self) -> &str {
        "Lookup baggage allowance and fees."
    }

    fn parameters_schema(&self) -> Value {
        string_params(&["query"])
    }

    async fn execute(&self, args: Value, _context: &mut AirlineAgentContext) -> Result<Value> {
        let q = required_str(&args, "query")?.to_lowercase();
        let answer = if q.contains("fee") {
            "Overweight bag fee is $75."
        } else if q.contains("allowance") {
            "One carry-on and one checked bag (up to 50 lbs) are included."
        } else {
            "Please provide details about your baggage inquiry."
        };
        Ok(Value::String(answer.to_string()))
    }
}

pub struct DisplaySeatMapTool;

#[async_trait]
impl Tool for DisplaySeatMapTool {
    fn name(&self) -> &str {
        SEAT_MAP_TOOL
    }

    fn description(&self) -> &str {
        "Display an interactive seat map to the customer so they can choose a new seat."
    }

    fn parameters_schema(&self) -> Value {
        string_params(&[])
    }

    async fn execute(&self, _args: Value, _context: &mut AirlineAgentContext) -> Result<Value> {
        Ok(Value::String(SEAT_MAP_DIRECTIVE.to_string()))
    }
}

pub struct CancelFlightTool;

#[async_trait]
impl Tool for CancelFlightTool {
    fn name(&self) -> &str {
        "cancel_flight"
    }

    fn description(&self) -> &str {
        "Cancel a flight."
    }

    fn parameters_schema(&self) -> Value {
        string_params(&[])
    }

    async fn execute(&self, _args: Value, context: &mut AirlineAgentContext) -> Result<Value> {
        let flight = context
            .flight_number
            .as_deref()
            .ok_or_else(|| AppError::InvalidInput("Flight number is required".into()))?;
        Ok(Value::String(format!("Flight {} successfully cancelled", flight)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("How many bags can I bring?", "You are allowed to bring one bag")]
    #[case("How many seats are on the plane?", "There are 120 seats")]
    #[case("Is there wifi?", "free wifi")]
    #[case("Do you serve lasagna?", "I don't know the answer")]
    #[tokio::test]
    async fn test_faq_lookup(#[case] question: &str, #[case] expected: &str) {
        let mut ctx = AirlineAgentContext::default();
        let out = FaqLookupTool
            .execute(json!({ "question": question }), &mut ctx)
            .await
            .unwrap();
        assert!(out.as_str().unwrap().contains(expected));
    }

    #[rstest]
    #[case("what is the fee for heavy bags", "Overweight bag fee is $75.")]
    #[case("what's my allowance", "One carry-on and one checked bag (up to 50 lbs) are included.")]
    #[case("help", "Please provide details about your baggage inquiry.")]
    #[tokio::test]
    async fn test_baggage_answers(#[case] query: &str, #[case] expected: &str) {
        let mut ctx = AirlineAgentContext::default();
        let out = BaggageTool
            .execute(json!({ "query": query }), &mut ctx)
            .await
            .unwrap();
        assert_eq!(out, Value::String(expected.to_string()));
    }

    #[tokio::test]
    async fn test_update_seat_writes_context() {
        let mut ctx = AirlineAgentContext {
            flight_number: Some("FLT-101".into()),
            ..Default::default()
        };
        let out = UpdateSeatTool
            .execute(
                json!({ "confirmation_number": "ABC123", "new_seat": "23A" }),
                &mut ctx,
            )
            .await
            .unwrap();
        assert_eq!(
            out,
            "Updated seat to 23A for confirmation number ABC123"
        );
        assert_eq!(ctx.seat_number.as_deref(), Some("23A"));
        assert_eq!(ctx.confirmation_number.as_deref(), Some("ABC123"));
    }

    #[tokio::test]
    async fn test_update_seat_requires_flight() {
        let mut ctx = AirlineAgentContext::default();
        let result = UpdateSeatTool
            .execute(
                json!({ "confirmation_number": "ABC123", "new_seat": "23A" }),
                &mut ctx,
            )
            .await;
        assert!(result.is_err());
        assert!(ctx.seat_number.is_none());
    }

    #[tokio::test]
    async fn test_cancel_flight() {
        let mut ctx = AirlineAgentContext::default();
        assert!(CancelFlightTool.execute(json!({}), &mut ctx).await.is_err());

        ctx.flight_number = Some("FLT-555".into());
        let out = CancelFlightTool.execute(json!({}), &mut ctx).await.unwrap();
        assert_eq!(out, "Flight FLT-555 successfully cancelled");
    }

    #[tokio::test]
    async fn test_seat_map_returns_directive() {
        let mut ctx = AirlineAgentContext::default();
        let out = DisplaySeatMapTool.execute(json!({}), &mut ctx).await.unwrap();
        assert_eq!(out, SEAT_MAP_DIRECTIVE);
    }

    #[tokio::test]
    async fn test_flight_status_requires_argument() {
        let mut ctx = AirlineAgentContext::default();
        assert!(FlightStatusTool.execute(json!({}), &mut ctx).await.is_err());
        let out = FlightStatusTool
            .execute(json!({ "flight_number": "FLT-9" }), &mut ctx)
            .await
            .unwrap();
        assert_eq!(
            out,
            "Flight FLT-9 is on time and scheduled to depart at gate A10."
        );
    }
}
