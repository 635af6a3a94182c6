//! Guardrail pipeline
//!
//! Input phase: an agent's input guardrails are evaluated concurrently but
//! their results are consumed in declared order, so "first triggered" always
//! means first in list order. Output phase: guardrails run one after another
//! against the candidate reply; the first non-empty rewrite replaces that
//! message and every verdict is kept for the audit trail.

use crate::agents::{AgentDefinition, AirlineAgentContext};
use crate::guardrails::OutputVerdict;
use crate::tools::airline::SEAT_MAP_DIRECTIVE;
use crate::types::{
    new_id, now_millis, AppError, GuardrailCheck, MessageResponse, OutputGuardrailCheck, Result,
};
use futures::stream::{FuturesOrdered, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How many input guardrails are evaluated and reported per turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputGuardrailMode {
    /// Stop at the first tripped guardrail; report the others as passed.
    #[default]
    FirstTrip,
    /// Wait for every guardrail and report each true verdict.
    EvaluateAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrippedGuardrail {
    pub name: String,
    pub reasoning: String,
}

/// Result of the input phase.
#[derive(Debug, Clone, Default)]
pub struct InputPhase {
    /// First tripped guardrail in declared order
    pub tripped: Option<TrippedGuardrail>,
    /// Audit rows recorded by this phase. Empty when nothing was worth recording.
    pub checks: Vec<GuardrailCheck>,
}

/// Per-guardrail output verdict, either computed here or handed back by the capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputGuardrailOutcome {
    pub name: String,
    /// Verdict, or the error text if evaluation failed
    pub verdict: std::result::Result<OutputVerdict, String>,
}

/// Run `agent`'s input guardrails against the newest user message.
///
/// An evaluation error fails the turn with [`AppError::Guardrail`].
pub async fn run_input_guardrails(
    agent: &AgentDefinition,
    context: &AirlineAgentContext,
    input: &str,
    mode: InputGuardrailMode,
) -> Result<InputPhase> {
    if agent.input_guardrails.is_empty() {
        return Ok(InputPhase::default());
    }

    let mut pending: FuturesOrdered<_> = agent
        .input_guardrails
        .iter()
        .map(|guardrail| async move {
            let result = guardrail.check(context, input).await;
            (guardrail.name().to_string(), result)
        })
        .collect();

    let mut verdicts = Vec::with_capacity(agent.input_guardrails.len());
    while let Some((name, result)) = pending.next().await {
        let verdict = result.map_err(|e| {
            warn!(agent = %agent.name, guardrail = %name, error = %e, "Input guardrail failed");
            AppError::Guardrail(format!("{}: {}", name, e))
        })?;
        debug!(
            agent = %agent.name,
            guardrail = %name,
            triggered = verdict.triggered,
            "Input guardrail evaluated"
        );
        let triggered = verdict.triggered;
        verdicts.push((name, verdict));
        if triggered && mode == InputGuardrailMode::FirstTrip {
            break;
        }
    }
    drop(pending);

    let tripped = verdicts
        .iter()
        .find(|(_, verdict)| verdict.triggered)
        .map(|(name, verdict)| TrippedGuardrail {
            name: name.clone(),
            reasoning: verdict.reasoning.clone(),
        });

    if let Some(t) = &tripped {
        info!(agent = %agent.name, guardrail = %t.name, reasoning = %t.reasoning, "Input guardrail tripped");
    }

    let checks = match (mode, &tripped) {
        (InputGuardrailMode::EvaluateAll, _) => verdicts
            .iter()
            .map(|(name, verdict)| {
                if verdict.triggered {
                    GuardrailCheck::failed(name, input, &verdict.reasoning)
                } else {
                    GuardrailCheck {
                        reasoning: verdict.reasoning.clone(),
                        ..GuardrailCheck::passed(name, input)
                    }
                }
            })
            .collect(),
        (InputGuardrailMode::FirstTrip, Some(t)) => {
            tripwire_checks(agent, &t.name, &t.reasoning, input)
        }
        (InputGuardrailMode::FirstTrip, None) => Vec::new(),
    };

    Ok(InputPhase { tripped, checks })
}

/// Audit rows for a trip: the tripped guardrail fails, every other configured
/// guardrail is reported as passed with empty reasoning.
pub fn tripwire_checks(
    agent: &AgentDefinition,
    tripped: &str,
    reasoning: &str,
    input: &str,
) -> Vec<GuardrailCheck> {
    let mut checks: Vec<GuardrailCheck> = agent
        .input_guardrails
        .iter()
        .map(|g| {
            if g.name() == tripped {
                GuardrailCheck::failed(g.name(), input, reasoning)
            } else {
                GuardrailCheck::passed(g.name(), input)
            }
        })
        .collect();

    if !checks.iter().any(|c| !c.passed) {
        checks.push(GuardrailCheck::failed(tripped, input, reasoning));
    }
    checks
}

/// Input audit rows for the agent that ends the turn: a row recorded this turn
/// under the same name wins, anything else is synthesized as passed.
pub fn final_input_checks(
    agent: &AgentDefinition,
    recorded: &[GuardrailCheck],
    input: &str,
) -> Vec<GuardrailCheck> {
    agent
        .input_guardrails
        .iter()
        .map(|g| {
            recorded
                .iter()
                .find(|c| c.name == g.name())
                .cloned()
                .unwrap_or_else(|| GuardrailCheck::passed(g.name(), input))
        })
        .collect()
}

/// Index of the message output guardrails judge: the last non-empty one
/// that is not the seat-map directive.
pub fn candidate_index(messages: &[MessageResponse]) -> Option<usize> {
    messages
        .iter()
        .rposition(|m| !m.content.trim().is_empty() && m.content != SEAT_MAP_DIRECTIVE)
}

/// Evaluate `agent`'s output guardrails sequentially, isolating failures.
pub async fn evaluate_output_guardrails(
    agent: &AgentDefinition,
    context: &AirlineAgentContext,
    text: &str,
) -> Vec<OutputGuardrailOutcome> {
    let mut outcomes = Vec::with_capacity(agent.output_guardrails.len());
    for guardrail in &agent.output_guardrails {
        let verdict = guardrail
            .review(context, text)
            .await
            .map_err(|e| e.to_string());
        outcomes.push(OutputGuardrailOutcome {
            name: guardrail.name().to_string(),
            verdict,
        });
    }
    outcomes
}

/// Output phase. Uses `precomputed` verdicts when the capability supplied
/// them, otherwise evaluates `agent`'s output guardrails. Applies the first
/// non-empty rewrite to the candidate message and returns one audit row per
/// guardrail.
pub async fn run_output_guardrails(
    agent: &AgentDefinition,
    context: &AirlineAgentContext,
    messages: &mut [MessageResponse],
    precomputed: Option<Vec<OutputGuardrailOutcome>>,
) -> Vec<OutputGuardrailCheck> {
    let index = candidate_index(messages);
    let candidate = index.map(|i| messages[i].content.clone());

    let outcomes = match (precomputed, &candidate) {
        (Some(outcomes), _) => outcomes,
        (None, Some(text)) => evaluate_output_guardrails(agent, context, text).await,
        (None, None) => {
            debug!(agent = %agent.name, "No candidate message for output guardrails");
            return Vec::new();
        }
    };

    let candidate = candidate.unwrap_or_default();
    let mut target = index.map(|i| &mut messages[i]);
    let mut records = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        let record = match outcome.verdict {
            Ok(verdict) => {
                let final_text = verdict.rewritten_text.unwrap_or_default();
                if !final_text.trim().is_empty() {
                    if let Some(message) = target.take() {
                        debug!(guardrail = %outcome.name, "Applying output guardrail rewrite");
                        message.content = final_text.clone();
                    }
                }
                OutputGuardrailCheck {
                    id: new_id(),
                    name: outcome.name,
                    input_text: candidate.clone(),
                    output: candidate.clone(),
                    reasoning: verdict.reasoning,
                    final_text,
                    tripwire_triggered: verdict.triggered,
                    timestamp: now_millis(),
                }
            }
            Err(error) => {
                warn!(guardrail = %outcome.name, error = %error, "Output guardrail failed");
                OutputGuardrailCheck {
                    id: new_id(),
                    name: outcome.name,
                    input_text: candidate.clone(),
                    output: "unknown".to_string(),
                    reasoning: error,
                    final_text: String::new(),
                    tripwire_triggered: false,
                    timestamp: now_millis(),
                }
            }
        };
        records.push(record);
    }

    records
}
