//! Compiled regex patterns for recognizing vibe-log hook commands.
//!
//! Hook commands are opaque shell strings in Claude Code's settings, so every
//! flag we care about is found by pattern rather than by parsing arguments.
//! Update these alongside `hooks::composer` when the command grammar changes.

use once_cell::sync::Lazy;
use regex::Regex;

// ═══════════════════════════════════════════════════════════════════════════════
// Flag Patterns
// ═══════════════════════════════════════════════════════════════════════════════

pub static RE_HOOK_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"--hook-version=(\d+)\.(\d+)\.(\d+)").unwrap());
pub static RE_HOOK_TRIGGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"--hook-trigger=([a-z]+)").unwrap());
pub static RE_ALL_FLAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)--all(?:\s|$)").unwrap());
pub static RE_DISABLED_FLAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)--disabled(?:\s|$)").unwrap());
/// Matches `--disabled` with its leading whitespace; replace with `$1`.
pub static RE_DISABLED_STRIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+--disabled(\s|$)").unwrap());

// ═══════════════════════════════════════════════════════════════════════════════
// CLI Prefix
// ═══════════════════════════════════════════════════════════════════════════════

/// Splits a managed command into the CLI invocation and everything from the
/// first known subcommand onwards.
pub static RE_CLI_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<cli>.+?)\s+(?P<rest>(?:send|analyze-prompt|pushup-challenge|statusline)(?:\s.*)?)$")
        .unwrap()
});
