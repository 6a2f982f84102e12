//! Output formatting - plain ASCII, colour only as emphasis.
//!
//! Colour is applied only when the stream is a terminal and `NO_COLOR` is
//! unset, so piped output is plain text.

use owo_colors::{OwoColorize, Stream};
use toolbox_core::{
    Action, ActionCategory, Diagnostic, ExecutionMode, ExecutionResult, HostProfile,
    ResolveError, TerminalEmulator, UpdateStatus,
};

pub fn display_host(host: &HostProfile, terminal: Option<TerminalEmulator>) {
    println!(
        "Distribution:    {}",
        host.distro_name().if_supports_color(Stream::Stdout, |t| t.bold())
    );
    println!("ID:              {}", host.distro_id());
    if host.family().is_known() {
        println!(
            "Package family:  {}",
            host.family().if_supports_color(Stream::Stdout, |t| t.cyan())
        );
    } else {
        println!(
            "Package family:  {}",
            "unknown (limited support)".if_supports_color(Stream::Stdout, |t| t.yellow())
        );
    }
    match terminal {
        Some(t) => println!("Terminal:        {}", t),
        None => println!(
            "Terminal:        {}",
            "none (background mode)".if_supports_color(Stream::Stdout, |t| t.dimmed())
        ),
    }
}

pub fn display_actions(rows: &[(Action, bool)]) {
    for category in ActionCategory::ALL {
        println!("[{}]", category.as_str().to_uppercase());
        for (action, supported) in rows.iter().filter(|(a, _)| a.category() == category) {
            let marker = if *supported {
                "[OK]".if_supports_color(Stream::Stdout, |t| t.green()).to_string()
            } else {
                "[--]".if_supports_color(Stream::Stdout, |t| t.dimmed()).to_string()
            };
            let params = action.required_params();
            let params = if params.is_empty() {
                String::new()
            } else {
                format!(" ({})", params.join(", "))
            };
            println!(
                "  {} {:<22}{} {}",
                marker,
                action.key(),
                params,
                action.title().if_supports_color(Stream::Stdout, |t| t.dimmed())
            );
        }
        println!();
    }
}

pub fn display_result(result: &ExecutionResult) {
    let tag = match (result.succeeded, result.mode) {
        (true, ExecutionMode::InteractiveTerminal) => "[LAUNCHED]"
            .if_supports_color(Stream::Stdout, |t| t.cyan())
            .to_string(),
        (true, ExecutionMode::CapturedBackground) => "[OK]"
            .if_supports_color(Stream::Stdout, |t| t.green())
            .to_string(),
        (false, _) => "[FAILED]"
            .if_supports_color(Stream::Stdout, |t| t.bright_red())
            .to_string(),
    };
    println!("{} {}", tag, result.message);
}

pub fn display_resolve_error(e: &ResolveError) {
    eprintln!(
        "{} {}",
        "[ERROR]".if_supports_color(Stream::Stderr, |t| t.bright_red()),
        e
    );
    if let ResolveError::UnknownAction(_) = e {
        eprintln!("Run 'toolboxctl actions' to list available actions.");
    }
}

pub fn display_update_status(status: &UpdateStatus) {
    let tag = match status {
        UpdateStatus::Pending(_) => "[UPDATES]"
            .if_supports_color(Stream::Stdout, |t| t.yellow())
            .to_string(),
        UpdateStatus::UpToDate => "[OK]"
            .if_supports_color(Stream::Stdout, |t| t.green())
            .to_string(),
        UpdateStatus::Unavailable(_) => "[NOTE]"
            .if_supports_color(Stream::Stdout, |t| t.dimmed())
            .to_string(),
    };
    println!("{} {}", tag, status.summary());
}

pub fn display_diagnostic(diagnostic: Diagnostic, result: &ExecutionResult) {
    // Drop the "<title> succeeded / Output:" framing for compact display
    let body = result
        .message
        .split_once("Output:\n")
        .map(|(_, body)| body)
        .unwrap_or(&result.message)
        .trim();
    let label = format!("{}:", diagnostic.title());
    let label = label.if_supports_color(Stream::Stdout, |t| t.bold());
    if result.succeeded {
        println!("{:<16} {}", label, body);
    } else {
        println!(
            "{:<16} {}",
            label,
            body.if_supports_color(Stream::Stdout, |t| t.bright_red())
        );
    }
}
