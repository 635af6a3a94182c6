//! The airline customer-service roster: triage plus four specialists.

use crate::agents::context::{random_confirmation_number, random_flight_number};
use crate::agents::{
    AgentDefinition, AgentRegistry, AirlineAgentContext, Handoff, HandoffHook, Instructions,
};
use crate::guardrails::GuardrailSet;
use crate::types::Result;

pub const TRIAGE_AGENT: &str = "Triage Agent";
pub const FAQ_AGENT: &str = "FAQ Agent";
pub const SEAT_BOOKING_AGENT: &str = "Seat Booking Agent";
pub const FLIGHT_STATUS_AGENT: &str = "Flight Status Agent";
pub const CANCELLATION_AGENT: &str = "Cancellation Agent";

/// Shared preamble telling every agent how transfers work.
pub const HANDOFF_PROMPT_PREFIX: &str = "# System context\n\
You are part of a multi-agent system for airline customer service. Agents can transfer the \
conversation to each other with `transfer_to_<agent_name>` tools. Transfers happen silently; \
do not mention or draw attention to them in your reply to the customer.";

/// Fills in a fresh flight and confirmation number when a seat change starts.
pub const SEAT_BOOKING_HOOK: HandoffHook = HandoffHook {
    name: "on_seat_booking_handoff",
    apply: on_seat_booking_handoff,
};

/// Makes sure a cancellation has a flight and confirmation number to work with.
pub const CANCELLATION_HOOK: HandoffHook = HandoffHook {
    name: "on_cancellation_handoff",
    apply: on_cancellation_handoff,
};

fn on_seat_booking_handoff(ctx: &mut AirlineAgentContext) {
    ctx.flight_number = Some(random_flight_number());
    ctx.confirmation_number = Some(random_confirmation_number());
}

fn on_cancellation_handoff(ctx: &mut AirlineAgentContext) {
    if ctx.confirmation_number.is_none() {
        ctx.confirmation_number = Some(random_confirmation_number());
    }
    if ctx.flight_number.is_none() {
        ctx.flight_number = Some(random_flight_number());
    }
}

fn unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("[unknown]")
}

fn triage_instructions() -> String {
    format!(
        "{}\nYou are a helpful triaging agent. You can use your tools to delegate questions to other appropriate agents.",
        HANDOFF_PROMPT_PREFIX
    )
}

fn faq_instructions() -> String {
    format!(
        "{}\nYou are an FAQ agent. If you are speaking to a customer, you probably were transferred to from the triage agent.\n\
         Use the following routine to support the customer.\n\
         1. Identify the last question asked by the customer.\n\
         2. Use the faq lookup tool to get the answer. Do not rely on your own knowledge.\n\
         3. Respond to the customer with the answer.",
        HANDOFF_PROMPT_PREFIX
    )
}

fn seat_booking_instructions(ctx: &AirlineAgentContext) -> String {
    format!(
        "{}\nYou are a seat booking agent. If you are speaking to a customer, you probably were transferred to from the triage agent.\n\
         Use the following routine to support the customer.\n\
         1. The customer's confirmation number is {}. If this is not available, ask the customer for their confirmation number. \
         If you have it, confirm that is the confirmation number they are referencing.\n\
         2. Ask the customer what their desired seat number is. You can also use the display_seat_map tool to show them an \
         interactive seat map where they can click to select their preferred seat.\n\
         3. Use the update seat tool to update the seat on the flight.\n\
         If the customer asks a question that is not related to the routine, transfer back to the triage agent.",
        HANDOFF_PROMPT_PREFIX,
        unknown(&ctx.confirmation_number)
    )
}

fn flight_status_instructions(ctx: &AirlineAgentContext) -> String {
    format!(
        "{}\nYou are a Flight Status Agent. Use the following routine to support the customer:\n\
         1. The customer's confirmation number is {} and flight number is {}.\n   \
         If either is not available, ask the customer for the missing information. If you have both, confirm with the customer that these are correct.\n\
         2. Use the flight_status_tool to report the status of the flight.\n\
         If the customer asks a question that is not related to flight status, transfer back to the triage agent.",
        HANDOFF_PROMPT_PREFIX,
        unknown(&ctx.confirmation_number),
        unknown(&ctx.flight_number)
    )
}

fn cancellation_instructions(ctx: &AirlineAgentContext) -> String {
    format!(
        "{}\nYou are a Cancellation Agent. Use the following routine to support the customer:\n\
         1. The customer's confirmation number is {} and flight number is {}.\n   \
         If either is not available, ask the customer for the missing information. If you have both, confirm with the customer that these are correct.\n\
         2. If the customer confirms, use the cancel_flight tool to cancel their flight.\n\
         If the customer asks anything else, transfer back to the triage agent.",
        HANDOFF_PROMPT_PREFIX,
        unknown(&ctx.confirmation_number),
        unknown(&ctx.flight_number)
    )
}

fn guarded(mut agent: AgentDefinition, guardrails: &GuardrailSet) -> AgentDefinition {
    agent.input_guardrails.extend(guardrails.input.iter().cloned());
    agent.output_guardrails.extend(guardrails.output.iter().cloned());
    agent
}

/// Build the airline registry with `guardrails` attached to every agent.
/// Triage is the default agent.
pub fn airline_registry(guardrails: &GuardrailSet) -> Result<AgentRegistry> {
    let triage = AgentDefinition::new(TRIAGE_AGENT, Instructions::Static(triage_instructions()))
        .with_description(
            "A triage agent that can delegate a customer's request to the appropriate agent.",
        )
        .with_handoff(Handoff::to(FLIGHT_STATUS_AGENT))
        .with_handoff(Handoff::to(CANCELLATION_AGENT).with_hook(CANCELLATION_HOOK))
        .with_handoff(Handoff::to(FAQ_AGENT))
        .with_handoff(Handoff::to(SEAT_BOOKING_AGENT).with_hook(SEAT_BOOKING_HOOK));

    let faq = AgentDefinition::new(FAQ_AGENT, Instructions::Static(faq_instructions()))
        .with_description("A helpful agent that can answer questions about the airline.")
        .with_tool("faq_lookup_tool")
        .with_handoff(Handoff::to(TRIAGE_AGENT));

    let seat_booking = AgentDefinition::new(
        SEAT_BOOKING_AGENT,
        Instructions::Dynamic(seat_booking_instructions),
    )
    .with_description("A helpful agent that can update a seat on a flight.")
    .with_tool("update_seat")
    .with_tool("display_seat_map")
    .with_handoff(Handoff::to(TRIAGE_AGENT));

    let flight_status = AgentDefinition::new(
        FLIGHT_STATUS_AGENT,
        Instructions::Dynamic(flight_status_instructions),
    )
    .with_description("An agent to provide flight status information.")
    .with_tool("flight_status_tool")
    .with_handoff(Handoff::to(TRIAGE_AGENT));

    let cancellation = AgentDefinition::new(
        CANCELLATION_AGENT,
        Instructions::Dynamic(cancellation_instructions),
    )
    .with_description("An agent to cancel flights.")
    .with_tool("cancel_flight")
    .with_handoff(Handoff::to(TRIAGE_AGENT));

    AgentRegistry::builder()
        .with_agent(guarded(triage, guardrails))
        .with_agent(guarded(faq, guardrails))
        .with_agent(guarded(seat_booking, guardrails))
        .with_agent(guarded(flight_status, guardrails))
        .with_agent(guarded(cancellation, guardrails))
        .with_default(TRIAGE_AGENT)
        .build()
}
