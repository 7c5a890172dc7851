//! Stub surfaces and stub-versus-implementation selection.

mod api_level;
mod resolver;
mod stubs;

pub use api_level::{ApiLevel, ApiLevelError};
pub use resolver::{SelectionRequest, SharedLibSelection, choose_stub_or_impl, crosses_boundary, effective_unit};
pub use stubs::{StubSurface, stub_surfaces};
