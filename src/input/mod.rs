pub mod bridge;
pub mod events;
pub mod handler;

// Re-export the essential types
pub use bridge::{ExternalEventBridge, ExternalEventSender, PumpStats, RawExternalEvent};
pub use events::{
    EventKind, ExternalEvent, MapServiceEvent, CLEAR_HIGHLIGHT_EVENT, EXTERNAL_SCHEMA_VERSION,
    FORMULA_PREVIEW_EVENT, HIGHLIGHT_COORDINATE_EVENT, REMOVE_BRUTE_FORCE_POINT_EVENT,
};
pub use handler::{EventBus, EventCallback, Subscription};
