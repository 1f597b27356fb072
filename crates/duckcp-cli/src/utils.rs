use std::{
    fmt::Display,
    io::Write,
    sync::{LazyLock, RwLock},
};

use duckcp_core::{DuckcpResult, ErrorContext};
use nu_ansi_term::Color;
use tracing::warn;

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub fn color_enabled() -> bool {
    COLOR.read().map(|color| *color).unwrap_or(false)
}

pub fn disable_color() {
    if let Ok(mut color) = COLOR.write() {
        *color = false;
    }
}

pub fn interactive_ask(ques: &str) -> DuckcpResult<String> {
    print!("{ques}");

    std::io::stdout()
        .flush()
        .with_context(|| "flushing stdout stream".to_string())?;

    let mut response = String::new();
    std::io::stdin()
        .read_line(&mut response)
        .with_context(|| "reading input from stdin".to_string())?;

    Ok(response.trim().to_owned())
}

pub fn confirm_action(message: &str) -> DuckcpResult<bool> {
    let response = interactive_ask(&format!("{message} [y/N]: "))?;
    Ok(is_yes(&response))
}

fn is_yes(response: &str) -> bool {
    matches!(response.to_lowercase().as_str(), "y" | "yes")
}

/// Asks before deleting something that other records depend on.
///
/// Returns `true` without asking when there are no dependents or `yes` is set.
pub fn confirm_cascade(subject: &str, dependents: &[(i64, &str)], yes: bool) -> DuckcpResult<bool> {
    let dependents: Vec<String> = dependents
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, what)| format!("{count} {what}"))
        .collect();
    if dependents.is_empty() || yes {
        return Ok(true);
    }

    let confirmed = confirm_action(&format!(
        "{subject} still has {}; delete them too?",
        dependents.join(" and ")
    ))?;
    if !confirmed {
        warn!("cancelled");
    }
    Ok(confirmed)
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if color_enabled() {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}
