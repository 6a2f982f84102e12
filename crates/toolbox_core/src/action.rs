//! Administrative actions offered by the toolbox.
//!
//! Each action is a stable key independent of any distribution. The command
//! it maps to on a given host lives in the template table (`registry`).

use serde::{Deserialize, Serialize};

/// Grouping used by front ends to lay actions out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Update,
    Packages,
    Maintenance,
    Processes,
}

impl ActionCategory {
    pub const ALL: [ActionCategory; 4] = [
        ActionCategory::Update,
        ActionCategory::Packages,
        ActionCategory::Maintenance,
        ActionCategory::Processes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionCategory::Update => "update",
            ActionCategory::Packages => "packages",
            ActionCategory::Maintenance => "maintenance",
            ActionCategory::Processes => "processes",
        }
    }
}

/// Abstract administrative intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    UpdateSystem,
    UpdateKeyring,
    CleanCache,
    InstallPkg,
    RemovePkg,
    SearchPkg,
    ListInstalled,
    CleanOrphans,
    TrimSsd,
    CheckUpdates,
    OptimizeMirrors,
    VacuumJournal,
    TuneSwappiness,
    RebuildFontCache,
    UpdateLocateDb,
    CleanBrowserCache,
    KillProcess,
}

impl Action {
    pub const ALL: [Action; 17] = [
        Action::UpdateSystem,
        Action::UpdateKeyring,
        Action::CleanCache,
        Action::InstallPkg,
        Action::RemovePkg,
        Action::SearchPkg,
        Action::ListInstalled,
        Action::CleanOrphans,
        Action::TrimSsd,
        Action::CheckUpdates,
        Action::OptimizeMirrors,
        Action::VacuumJournal,
        Action::TuneSwappiness,
        Action::RebuildFontCache,
        Action::UpdateLocateDb,
        Action::CleanBrowserCache,
        Action::KillProcess,
    ];

    /// Stable string key
    pub fn key(&self) -> &'static str {
        match self {
            Action::UpdateSystem => "update_system",
            Action::UpdateKeyring => "update_keyring",
            Action::CleanCache => "clean_cache",
            Action::InstallPkg => "install_pkg",
            Action::RemovePkg => "remove_pkg",
            Action::SearchPkg => "search_pkg",
            Action::ListInstalled => "list_installed",
            Action::CleanOrphans => "clean_orphans",
            Action::TrimSsd => "trim_ssd",
            Action::CheckUpdates => "check_updates",
            Action::OptimizeMirrors => "optimize_mirrors",
            Action::VacuumJournal => "vacuum_journal",
            Action::TuneSwappiness => "tune_swappiness",
            Action::RebuildFontCache => "rebuild_font_cache",
            Action::UpdateLocateDb => "update_locate_db",
            Action::CleanBrowserCache => "clean_browser_cache",
            Action::KillProcess => "kill_process",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL.iter().copied().find(|a| a.key() == key)
    }

    /// Human-readable title shown while the action runs
    pub fn title(&self) -> &'static str {
        match self {
            Action::UpdateSystem => "System update",
            Action::UpdateKeyring => "Refresh signing keys",
            Action::CleanCache => "Clean package cache",
            Action::InstallPkg => "Install package",
            Action::RemovePkg => "Remove package",
            Action::SearchPkg => "Search packages",
            Action::ListInstalled => "Installed packages",
            Action::CleanOrphans => "Remove orphaned packages",
            Action::TrimSsd => "SSD TRIM",
            Action::CheckUpdates => "Check for updates",
            Action::OptimizeMirrors => "Rank package mirrors",
            Action::VacuumJournal => "Trim system journal",
            Action::TuneSwappiness => "Tune swappiness",
            Action::RebuildFontCache => "Rebuild font cache",
            Action::UpdateLocateDb => "Update file database",
            Action::CleanBrowserCache => "Clean browser caches",
            Action::KillProcess => "Kill process",
        }
    }

    /// Named parameters the templates substitute
    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            Action::InstallPkg | Action::RemovePkg | Action::SearchPkg => &["pkg"],
            Action::OptimizeMirrors => &["country"],
            Action::KillProcess => &["pid"],
            _ => &[],
        }
    }

    /// Whether the action modifies the system and must run as superuser
    pub fn requires_elevation(&self) -> bool {
        !matches!(
            self,
            Action::SearchPkg
                | Action::ListInstalled
                | Action::CheckUpdates
                | Action::CleanBrowserCache
                | Action::KillProcess
        )
    }

    pub fn category(&self) -> ActionCategory {
        match self {
            Action::UpdateSystem
            | Action::UpdateKeyring
            | Action::CheckUpdates
            | Action::OptimizeMirrors => ActionCategory::Update,
            Action::InstallPkg
            | Action::RemovePkg
            | Action::SearchPkg
            | Action::ListInstalled
            | Action::CleanOrphans => ActionCategory::Packages,
            Action::CleanCache
            | Action::TrimSsd
            | Action::VacuumJournal
            | Action::TuneSwappiness
            | Action::RebuildFontCache
            | Action::UpdateLocateDb
            | Action::CleanBrowserCache => ActionCategory::Maintenance,
            Action::KillProcess => ActionCategory::Processes,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Action {
    type Err = crate::error::ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::parse(s).ok_or_else(|| crate::error::ResolveError::UnknownAction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::parse(action.key()), Some(action));
        }
        assert_eq!(Action::parse(" clean_cache "), Some(Action::CleanCache));
        assert_eq!(Action::parse("format_disk"), None);
    }

    #[test]
    fn test_keys_unique() {
        let mut keys: Vec<&str> = Action::ALL.iter().map(|a| a.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), Action::ALL.len());
    }

    #[test]
    fn test_package_actions_need_pkg() {
        assert_eq!(Action::InstallPkg.required_params(), &["pkg"]);
        assert_eq!(Action::RemovePkg.required_params(), &["pkg"]);
        assert_eq!(Action::SearchPkg.required_params(), &["pkg"]);
        assert!(Action::UpdateSystem.required_params().is_empty());
    }

    #[test]
    fn test_kill_process_metadata() {
        let action = Action::parse("kill_process").unwrap();
        assert_eq!(action.required_params(), &["pid"]);
        assert_eq!(action.category(), ActionCategory::Processes);
        assert!(!action.requires_elevation());
    }

    #[test]
    fn test_read_only_actions_skip_elevation() {
        assert!(!Action::SearchPkg.requires_elevation());
        assert!(!Action::ListInstalled.requires_elevation());
        assert!(Action::InstallPkg.requires_elevation());
        assert!(Action::TrimSsd.requires_elevation());
    }

    #[test]
    fn test_from_str_unknown() {
        let err = "reboot_now".parse::<Action>().unwrap_err();
        assert!(err.to_string().contains("reboot_now"));
    }
}
