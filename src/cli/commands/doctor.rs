//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Gist Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    // yt-dlp is required for videos; speech tools only for audio output.
    println!("{}", style("External Tools").bold());
    let tool_checks = vec![
        check_tool(&settings.youtube.ytdlp_path, "--version", install_hint_ytdlp(), true),
        check_tool(&settings.speech.engine_path, "--version", install_hint_espeak(), false),
        check_tool(&settings.speech.ffmpeg_path, "-version", install_hint_ffmpeg(), false),
    ];
    for check in &tool_checks {
        check.print();
    }
    checks.extend(tool_checks);

    println!();

    println!("{}", style("API Configuration").bold());
    let api_check = check_api_key(&settings.llm.api_key_env, std::env::var(&settings.llm.api_key_env).ok());
    api_check.print();
    checks.push(api_check);
    let model_check = CheckResult::ok(
        "Default model",
        &format!("{} via {}", settings.llm.model, settings.llm.api_base),
    );
    model_check.print();
    checks.push(model_check);

    println!();

    println!("{}", style("Directories").bold());
    let dir_checks = vec![
        check_directory("Output directory", &settings.output_dir()),
        check_directory("Temp directory", &settings.temp_dir()),
    ];
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(&Settings::default_config_path());
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Gist.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!(
            "All checks passed with {} warning(s).",
            warnings
        ));
    } else {
        Output::success("All checks passed! Gist is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
///
/// Missing optional tools are reported as warnings.
fn check_tool(name: &str, version_arg: &str, hint: &str, required: bool) -> CheckResult {
    let missing = |message: &str| {
        if required {
            CheckResult::error(name, message, hint)
        } else {
            CheckResult::warning(name, &format!("{} (needed for audio)", message), hint)
        }
    };

    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();
            CheckResult::ok(name, &truncate(&version, 50))
        }
        Ok(_) => missing("installed but not working"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => missing("not found"),
        Err(e) => missing(&format!("error: {}", e)),
    }
}

/// Check that the API key variable holds something.
fn check_api_key(var: &str, value: Option<String>) -> CheckResult {
    let hint = format!("Set with: export {}='gsk_...' (or add it to .env)", var);
    match value {
        Some(key) if key.trim().is_empty() => CheckResult::error(var, "empty", &hint),
        Some(key) if key.is_ascii() && key.len() > 12 => {
            let masked = format!("{}...{}", &key[..4], &key[key.len() - 4..]);
            CheckResult::ok(var, &format!("configured ({})", masked))
        }
        Some(_) => CheckResult::warning(var, "set but looks too short", &hint),
        None => CheckResult::error(var, "not set", &hint),
    }
}

fn check_directory(name: &str, dir: &Path) -> CheckResult {
    if dir.is_dir() {
        CheckResult::ok(name, &dir.display().to_string())
    } else if dir.exists() {
        CheckResult::error(
            name,
            &format!("{} is not a directory", dir.display()),
            "Point general settings at a directory",
        )
    } else {
        CheckResult::warning(
            name,
            &format!("{} (will be created)", dir.display()),
            "Directory will be created on first use",
        )
    }
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: gist config edit",
        )
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

fn install_hint_espeak() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install espeak-ng"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install espeak-ng (or your package manager)"
    } else {
        "Install from: https://github.com/espeak-ng/espeak-ng"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_missing_tool_severity() {
        let required = check_tool("gist-test-no-such-tool", "--version", "hint", true);
        assert_eq!(required.status, CheckStatus::Error);

        let optional = check_tool("gist-test-no-such-tool", "--version", "hint", false);
        assert_eq!(optional.status, CheckStatus::Warning);
        assert!(optional.message.contains("needed for audio"));
    }

    #[test]
    fn test_check_api_key() {
        assert_eq!(check_api_key("GROQ_API_KEY", None).status, CheckStatus::Error);
        assert_eq!(
            check_api_key("GROQ_API_KEY", Some("  ".to_string())).status,
            CheckStatus::Error
        );
        assert_eq!(
            check_api_key("GROQ_API_KEY", Some("short".to_string())).status,
            CheckStatus::Warning
        );

        let ok = check_api_key("GROQ_API_KEY", Some("gsk_abcdefghijklmnop".to_string()));
        assert_eq!(ok.status, CheckStatus::Ok);
        assert_eq!(ok.message, "configured (gsk_...mnop)");
    }

    #[test]
    fn test_check_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(check_directory("Out", dir.path()).status, CheckStatus::Ok);
        assert_eq!(
            check_directory("Out", &dir.path().join("missing")).status,
            CheckStatus::Warning
        );

        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert_eq!(check_directory("Out", &file).status, CheckStatus::Error);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("yt-dlp 2024.08.06", 50), "yt-dlp 2024.08.06");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
