// Startup module - displays banner and component status
//
// Shows version, upstream, credential status, telemetry mode and bind
// address. The credential value itself is never printed.

use std::io::Write;

use crate::config::{Config, LogMode, VERSION};

/// ANSI color codes for terminal output
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const MAGENTA: &str = "\x1b[35m";
}

/// Component status for display
pub struct ComponentStatus {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

fn component_status(config: &Config) -> Vec<ComponentStatus> {
    let events_detail = match (config.events.mode, &config.events.path) {
        (LogMode::Off, _) => "off".to_string(),
        (LogMode::Metadata, Some(path)) => format!("metadata -> {}", path.display()),
        (LogMode::Metadata, None) => "metadata -> stdout".to_string(),
    };

    vec![
        ComponentStatus {
            name: "upstream",
            ok: true,
            detail: config.upstream.api_url.clone(),
        },
        ComponentStatus {
            name: "credential",
            ok: config.upstream.has_credential(),
            detail: if config.upstream.has_credential() {
                "configured".to_string()
            } else {
                "OPENROUTER_API_KEY not set".to_string()
            },
        },
        ComponentStatus {
            name: "events",
            ok: config.events.mode.is_enabled(),
            detail: events_detail,
        },
    ]
}

fn render_banner(config: &Config) -> String {
    use colors::*;

    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!("  {BOLD}{CYAN}Usage Relay{RESET} {DIM}v{VERSION}{RESET}\n"));
    out.push_str(&format!(
        "  {DIM}Attribution proxy for OpenAI-compatible APIs{RESET}\n\n"
    ));

    for component in component_status(config) {
        let icon = if component.ok {
            format!("{GREEN}✓{RESET}")
        } else {
            format!("{YELLOW}!{RESET}")
        };
        out.push_str(&format!(
            "    {icon} {:<12} {DIM}{}{RESET}\n",
            component.name, component.detail
        ));
    }

    out.push('\n');
    out.push_str(&format!(
        "  {MAGENTA}▸{RESET} Relay listening on {BOLD}{}{RESET}\n\n",
        config.bind_addr
    ));
    out
}

/// Print the startup banner
///
/// Goes to stdout unless telemetry events are also written there, in which
/// case it goes to stderr so the JSONL stream stays parseable.
pub fn print_startup(config: &Config) {
    let banner = render_banner(config);
    let events_on_stdout = config.events.mode.is_enabled() && config.events.path.is_none();

    let result = if events_on_stdout {
        std::io::stderr().write_all(banner.as_bytes())
    } else {
        std::io::stdout().write_all(banner.as_bytes())
    };
    if let Err(e) = result {
        tracing::debug!("Could not print startup banner: {}", e);
    }
}

/// Mirror the banner into the diagnostic log
pub fn log_startup(config: &Config) {
    tracing::info!("Usage Relay v{}", VERSION);
    for component in component_status(config) {
        let icon = if component.ok { "✓" } else { "!" };
        tracing::info!("  {} {} - {}", icon, component.name, component.detail);
    }

    if !config.upstream.has_credential() {
        tracing::warn!("OPENROUTER_API_KEY not set; every proxied request will fail with 500");
    }

    tracing::info!("▸ Listening on {}", config.bind_addr);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_never_contains_credential() {
        let mut config = Config::default();
        config.upstream.api_key = Some("sk-or-v1-secret".to_string());

        let banner = render_banner(&config);
        assert!(!banner.contains("sk-or-v1-secret"));
        assert!(banner.contains("configured"));
        assert!(banner.contains(&config.upstream.api_url));
        assert!(banner.contains("0.0.0.0:8000"));
    }

    #[test]
    fn test_banner_flags_missing_credential() {
        let config = Config::default();
        let status = component_status(&config);
        let credential = status.iter().find(|c| c.name == "credential").unwrap();
        assert!(!credential.ok);
        assert!(render_banner(&config).contains("OPENROUTER_API_KEY not set"));
    }

    #[test]
    fn test_events_status_reports_destination() {
        let mut config = Config::default();
        assert!(render_banner(&config).contains("metadata -> stdout"));

        config.events.mode = LogMode::Off;
        let status = component_status(&config);
        let events = status.iter().find(|c| c.name == "events").unwrap();
        assert!(!events.ok);
        assert_eq!(events.detail, "off");
    }
}
