//! Server-Sent Events (SSE) framing
//!
//! Shared framing between the sync pipeline's event channel and the wire:
//! each `SyncEvent` becomes one SSE frame whose event name is the `type` tag
//! and whose data is the full JSON object (the JSON repeats the tag so
//! clients can ignore the SSE event name and parse `data` alone).

use axum::response::sse::Event;

use crate::events::SyncEvent;

/// Frame a sync event for the wire.
pub fn frame_event(event: &SyncEvent) -> Result<Event, serde_json::Error> {
    let data = serde_json::to_string(event)?;
    Ok(Event::default().event(event.event_type()).data(data))
}
