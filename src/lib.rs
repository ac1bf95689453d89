// Module layout (Clean Architecture style)
// - bootstrap: configuration and wiring
// - infrastructure: HTTP client, in-memory vault, session storage, timers
// - presentation: CLI commands and text rendering
// - application: access scope, hierarchy model, drag state machine, use cases
// - domain: core models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
