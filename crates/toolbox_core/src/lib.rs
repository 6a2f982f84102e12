//! Linux Toolbox core - cross-distribution command resolution and execution.
//!
//! Detects the host's package-manager family, maps abstract actions to the
//! right shell command for it, and runs that command either in a visible
//! terminal or captured in the background with a timeout.

pub mod action;
pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod host;
pub mod logging;
pub mod registry;
pub mod shell;
pub mod updates;

pub use action::{Action, ActionCategory};
pub use config::EngineConfig;
pub use diagnostics::Diagnostic;
pub use dispatch::terminal::{BinaryProbe, FixedProbe, PathProbe, TerminalEmulator};
pub use dispatch::{Dispatcher, ExecutionMode, ExecutionRequest, ExecutionResult};
pub use engine::Engine;
pub use error::ResolveError;
pub use host::{HostProfile, PackageFamily};
pub use registry::{CommandRegistry, Params, TemplateTable};
pub use updates::UpdateStatus;
