//! Command registry - action x package family -> shell command.
//!
//! Templates are data: a table keyed first by action, then by family, built
//! once and handed to the registry. A missing entry means the action is not
//! offered on that family. Placeholders use `{name}` and are substituted
//! literally; values are checked against a package-name allow-list first
//! unless validation is switched off.

use crate::action::Action;
use crate::error::ResolveError;
use crate::host::{HostProfile, PackageFamily};
use crate::shell;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Named parameters supplied by the caller
pub type Params = HashMap<String, String>;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex"));

static SAFE_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9@._+:-]*$").expect("value regex"));

const TRIM: &str = "sudo systemctl enable fstrim.timer && sudo fstrim -av";
const VACUUM: &str = "sudo journalctl --vacuum-time=7d";
const SWAPPINESS: &str =
    "echo 'vm.swappiness=10' | sudo tee /etc/sysctl.d/99-swappiness.conf && sudo sysctl --system";
const FONT_CACHE: &str = "sudo fc-cache -fv";
const LOCATE_DB: &str = "sudo updatedb";
const BROWSER_CACHE: &str = "rm -rf ~/.cache/*/Cache/* ~/.cache/*/cache2/* 2>/dev/null || true";
const KILL: &str = "kill -9 {pid}";

/// Immutable template table
#[derive(Debug, Clone, Default)]
pub struct TemplateTable {
    templates: HashMap<Action, HashMap<PackageFamily, String>>,
}

impl TemplateTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a template; later entries for the same pair replace earlier ones
    pub fn with(mut self, action: Action, family: PackageFamily, template: &str) -> Self {
        self.templates
            .entry(action)
            .or_default()
            .insert(family, template.to_string());
        self
    }

    /// Same template for every supported family
    pub fn with_all(mut self, action: Action, template: &str) -> Self {
        for family in PackageFamily::SUPPORTED {
            self = self.with(action, family, template);
        }
        self
    }

    /// The table shipped with the toolbox
    pub fn builtin() -> Self {
        use Action::*;
        use PackageFamily::*;

        Self::empty()
            .with(UpdateSystem, Pacman, "sudo pacman -Syu --noconfirm")
            .with(UpdateSystem, Apt, "sudo apt update && sudo apt upgrade -y")
            .with(UpdateSystem, Dnf, "sudo dnf update -y")
            .with(UpdateSystem, Zypper, "sudo zypper refresh && sudo zypper update -y")
            .with(UpdateKeyring, Pacman, "sudo pacman -S archlinux-keyring --noconfirm")
            .with(UpdateKeyring, Apt, "sudo apt install --reinstall ca-certificates gnupg -y")
            .with(UpdateKeyring, Dnf, "sudo dnf reinstall -y rpm")
            .with(UpdateKeyring, Zypper, "sudo zypper refresh --force")
            .with(CleanCache, Pacman, "sudo pacman -Sc --noconfirm")
            .with(CleanCache, Apt, "sudo apt clean && sudo apt autoclean")
            .with(CleanCache, Dnf, "sudo dnf clean all")
            .with(CleanCache, Zypper, "sudo zypper clean -a")
            .with(InstallPkg, Pacman, "sudo pacman -S {pkg} --noconfirm")
            .with(InstallPkg, Apt, "sudo apt install {pkg} -y")
            .with(InstallPkg, Dnf, "sudo dnf install {pkg} -y")
            .with(InstallPkg, Zypper, "sudo zypper install -y {pkg}")
            .with(RemovePkg, Pacman, "sudo pacman -R {pkg} --noconfirm")
            .with(RemovePkg, Apt, "sudo apt remove {pkg} -y")
            .with(RemovePkg, Dnf, "sudo dnf remove {pkg} -y")
            .with(RemovePkg, Zypper, "sudo zypper remove -y {pkg}")
            .with(SearchPkg, Pacman, "pacman -Ss {pkg}")
            .with(SearchPkg, Apt, "apt search {pkg}")
            .with(SearchPkg, Dnf, "dnf search {pkg}")
            .with(SearchPkg, Zypper, "zypper search {pkg}")
            .with(ListInstalled, Pacman, "pacman -Q")
            .with(ListInstalled, Apt, "apt list --installed")
            .with(ListInstalled, Dnf, "dnf list installed")
            .with(ListInstalled, Zypper, "zypper search --installed-only")
            .with(
                CleanOrphans,
                Pacman,
                "sudo pacman -Rns $(pacman -Qdtq) --noconfirm 2>/dev/null || echo 'No orphaned packages'",
            )
            .with(CleanOrphans, Apt, "sudo apt autoremove -y")
            .with(CleanOrphans, Dnf, "sudo dnf autoremove -y")
            .with(
                CleanOrphans,
                Zypper,
                "sudo zypper packages --unneeded | awk -F'|' 'NF > 3 && $1 ~ /i/ {print $3}' | xargs -r sudo zypper remove -y",
            )
            .with_all(TrimSsd, TRIM)
            .with(CheckUpdates, Pacman, "pacman -Qu")
            .with(CheckUpdates, Apt, "apt list --upgradable")
            .with(CheckUpdates, Dnf, "dnf -q check-update; test $? -ne 1")
            .with(CheckUpdates, Zypper, "zypper -q list-updates")
            .with(
                OptimizeMirrors,
                Pacman,
                "sudo reflector --country {country} --latest 10 --sort rate --save /etc/pacman.d/mirrorlist && sudo pacman -Syy",
            )
            .with_all(VacuumJournal, VACUUM)
            .with_all(TuneSwappiness, SWAPPINESS)
            .with_all(RebuildFontCache, FONT_CACHE)
            .with_all(UpdateLocateDb, LOCATE_DB)
            .with_all(CleanBrowserCache, BROWSER_CACHE)
            .with_all(KillProcess, KILL)
    }

    pub fn get(&self, action: Action, family: PackageFamily) -> Option<&str> {
        self.templates
            .get(&action)
            .and_then(|by_family| by_family.get(&family))
            .map(String::as_str)
    }

    /// Every (action, family, template) entry
    pub fn entries(&self) -> impl Iterator<Item = (Action, PackageFamily, &str)> {
        self.templates.iter().flat_map(|(action, by_family)| {
            by_family
                .iter()
                .map(move |(family, template)| (*action, *family, template.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.templates.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Placeholder names in template order, without duplicates
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        if let Some(m) = caps.get(1) {
            if !names.contains(&m.as_str()) {
                names.push(m.as_str());
            }
        }
    }
    names
}

/// Message returned in place of a command when a host has no template
pub fn unsupported_command(action: Action, host: &HostProfile) -> String {
    let text = format!(
        "{} is not supported on this system: {} ({})",
        action.title(),
        host.distro_name(),
        host.family()
    );
    format!("echo {}", shell::quote(&text))
}

/// Resolves actions against the template table. Read-only after construction.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    table: TemplateTable,
    validate: bool,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new(TemplateTable::builtin())
    }
}

impl CommandRegistry {
    pub fn new(table: TemplateTable) -> Self {
        Self {
            table,
            validate: true,
        }
    }

    /// Toggle the parameter allow-list
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn table(&self) -> &TemplateTable {
        &self.table
    }

    pub fn is_supported(&self, action: Action, family: PackageFamily) -> bool {
        self.table.get(action, family).is_some()
    }

    /// Actions with a template for `family`, in catalogue order
    pub fn supported_actions(&self, family: PackageFamily) -> Vec<Action> {
        Action::ALL
            .iter()
            .copied()
            .filter(|a| self.is_supported(*a, family))
            .collect()
    }

    /// Turn an action into a command for `host`.
    ///
    /// Hosts without a template get an `echo` naming the host instead of an
    /// error, so the result can be shown or run as-is.
    pub fn resolve(
        &self,
        action: Action,
        host: &HostProfile,
        params: &Params,
    ) -> Result<String, ResolveError> {
        let Some(template) = self.table.get(action, host.family()) else {
            warn!(
                "No {} template for {} ({})",
                action,
                host.distro_name(),
                host.family()
            );
            return Ok(unsupported_command(action, host));
        };

        let command = self.substitute(template, params)?;
        debug!("Resolved {} on {} -> {}", action, host.family(), command);
        Ok(command)
    }

    /// Resolve by string key
    pub fn resolve_key(
        &self,
        key: &str,
        host: &HostProfile,
        params: &Params,
    ) -> Result<String, ResolveError> {
        let action: Action = key.parse()?;
        self.resolve(action, host, params)
    }

    fn substitute(&self, template: &str, params: &Params) -> Result<String, ResolveError> {
        for name in placeholders(template) {
            let value = params
                .get(name)
                .ok_or_else(|| ResolveError::MissingParameter(name.to_string()))?;
            if self.validate && !SAFE_VALUE.is_match(value) {
                return Err(ResolveError::InvalidParameter {
                    name: name.to_string(),
                    value: value.clone(),
                });
            }
        }

        // Single pass so substituted values are never rescanned
        let command = PLACEHOLDER.replace_all(template, |caps: &regex::Captures| {
            params.get(&caps[1]).cloned().unwrap_or_default()
        });
        Ok(command.into_owned())
    }
}
