//! Activation policies.
//!
//! ## Contents
//! - [`Mode`] whether a controller should be up, and whether it demands its dependencies
//!
//! ## Quick wiring
//! ```text
//! ServiceSpec { mode: Option<Mode>, .. }
//!      └─► controller uses:
//!           - mode.should_start(demand) to decide Down → Starting / Up → Stopping
//!           - mode.demands_dependencies(demand) to add/remove demand on its edges
//! ```
//!
//! ## Defaults
//! - `Mode::Active`, overridable per container with `ContainerConfig::default_mode`.

mod mode;

pub use mode::Mode;
