// Event dispatch components
//
// This module holds the event model, the handler contract, and the dispatcher
// that sweeps registered handlers for each incoming room event.

// Public API - what other modules can use
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use events::{MessageEvent, TransportEvent};
pub use handler::{EventHandler, FnHandler, HandlerError, NoOpHandler};
pub use registry::HandlerRegistry;

// Internal modules
mod dispatcher;
mod events;
mod handler;
mod registry;
