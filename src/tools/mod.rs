//! Domain tools invoked by the agent capability.
//!
//! # Module Structure
//!
//! - [`airline`](crate::tools::airline) - FAQ, seat, flight status, baggage and cancellation tools
//! - [`registry`](crate::tools::registry) - Tool registration and execution
//!
//! Tools receive the conversation's [`AirlineAgentContext`](crate::agents::AirlineAgentContext)
//! mutably, so a tool like `update_seat` can record the new seat directly.
//!
//! ```ignore
//! let registry = ToolRegistry::with_airline_tools();
//! let out = registry.execute("flight_status_tool", json!({"flight_number": "FLT-123"}), &mut ctx).await?;
//! ```

/// Airline customer-service tools.
pub mod airline;
/// Tool registry for managing available tools.
pub mod registry;

pub use registry::{Tool, ToolRegistry};
