pub mod clause;
pub mod compiler;
pub mod layer;
pub mod toggle;

pub use clause::TrafficClause;
pub use compiler::{ClauseGroup, CompiledPolicy, compile};
pub use layer::EnforcementLayer;
pub use toggle::{ToggleKey, ToggleSelection};
