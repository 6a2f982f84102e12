//! Engine facade - the only surface front ends talk to.
//!
//! Holds the host profile, the registry and the dispatcher. Front ends pass an
//! action key plus parameters and get back a success flag and a bounded
//! message.

use crate::action::Action;
use crate::config::EngineConfig;
use crate::diagnostics::Diagnostic;
use crate::dispatch::terminal::BinaryProbe;
use crate::dispatch::{Dispatcher, ExecutionRequest, ExecutionResult};
use crate::error::ResolveError;
use crate::host::HostProfile;
use crate::registry::{CommandRegistry, Params, TemplateTable};
use std::sync::Arc;
use tracing::info;

pub struct Engine {
    host: Arc<HostProfile>,
    registry: CommandRegistry,
    dispatcher: Dispatcher,
}

impl Engine {
    /// Engine for the running host (profile detected once per process)
    pub fn new(config: &EngineConfig) -> Self {
        let host = HostProfile::current_from(&config.os_release_paths);
        Self::with_host(host, config)
    }

    /// Engine for an explicit profile
    pub fn with_host(host: Arc<HostProfile>, config: &EngineConfig) -> Self {
        let registry = CommandRegistry::new(TemplateTable::builtin())
            .with_validation(config.validate_parameters);
        let dispatcher = Dispatcher::new(host.clone(), config);
        info!(
            "Engine ready for {} ({}), {} actions available",
            host.distro_name(),
            host.family(),
            registry.supported_actions(host.family()).len()
        );
        Self {
            host,
            registry,
            dispatcher,
        }
    }

    pub fn with_registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_probe(mut self, probe: impl BinaryProbe + 'static) -> Self {
        self.dispatcher = self.dispatcher.with_probe(probe);
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn detect_host(&self) -> &HostProfile {
        &self.host
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Actions this host has templates for
    pub fn available_actions(&self) -> Vec<Action> {
        self.registry.supported_actions(self.host.family())
    }

    pub fn resolve(&self, action_key: &str, params: &Params) -> Result<String, ResolveError> {
        self.registry.resolve_key(action_key, &self.host, params)
    }

    /// Resolve `action` and attach its title and elevation flag.
    ///
    /// The title carries the first parameter value, e.g. "Install package: vim".
    pub fn request(
        &self,
        action: Action,
        params: &Params,
    ) -> Result<ExecutionRequest, ResolveError> {
        let command = self.registry.resolve(action, &self.host, params)?;
        let supported = self.registry.is_supported(action, self.host.family());
        let subject = action
            .required_params()
            .first()
            .and_then(|name| params.get(*name));
        let title = match subject {
            Some(value) if supported => format!("{}: {}", action.title(), value),
            _ => action.title().to_string(),
        };
        Ok(ExecutionRequest::new(
            command,
            title,
            supported && action.requires_elevation(),
        ))
    }

    pub async fn run(
        &self,
        command: &str,
        title: &str,
        requires_elevation: bool,
    ) -> ExecutionResult {
        self.dispatcher
            .execute_command(command, title, requires_elevation)
            .await
    }

    /// Resolve and run in one step.
    ///
    /// Unsupported actions run their informational `echo` captured, so no
    /// terminal window opens just to print it.
    pub async fn perform(
        &self,
        action_key: &str,
        params: &Params,
    ) -> Result<ExecutionResult, ResolveError> {
        let action: Action = action_key.parse()?;
        let request = self.request(action, params)?;
        if self.registry.is_supported(action, self.host.family()) {
            Ok(self.dispatcher.execute(&request).await)
        } else {
            Ok(self
                .dispatcher
                .run_captured(&request.resolved_command, &request.display_title)
                .await)
        }
    }

    pub async fn diagnose(&self, diagnostic: Diagnostic) -> ExecutionResult {
        self.dispatcher
            .run_captured(diagnostic.command(), diagnostic.title())
            .await
    }

    /// Run `set` one after another
    pub async fn diagnose_all(&self, set: &[Diagnostic]) -> Vec<(Diagnostic, ExecutionResult)> {
        let mut results = Vec::with_capacity(set.len());
        for diagnostic in set {
            results.push((*diagnostic, self.diagnose(*diagnostic).await));
        }
        results
    }

    /// Summary diagnostics
    pub async fn snapshot(&self) -> Vec<(Diagnostic, ExecutionResult)> {
        self.diagnose_all(&Diagnostic::SUMMARY).await
    }
}
