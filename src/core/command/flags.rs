//! Which flags each dbt sub-command accepts.
//!
//! Sub-commands are rows in `SUBCOMMAND_FLAGS`; a row lists the flag groups it
//! accepts. A sub-command missing from the table only receives `GLOBAL_FLAGS`.

/// Accepted by every sub-command.
pub const GLOBAL_FLAGS: &[&str] = &[
    "debug",
    "log-format",
    "log-format-file",
    "log-level",
    "log-level-file",
    "quiet",
    "use-colors",
    "no-use-colors",
    "printer-width",
    "warn-error",
    "warn-error-options",
    "partial-parse",
    "no-partial-parse",
    "version-check",
    "no-version-check",
    "send-anonymous-usage-stats",
    "no-send-anonymous-usage-stats",
    "record-timing-info",
    "cache-selected-only",
];

/// Locating and configuring the project.
const PROJECT: &[&str] = &[
    "project-dir",
    "profiles-dir",
    "profile",
    "target",
    "target-path",
    "log-path",
    "vars",
];

const SELECTION: &[&str] = &["select", "exclude", "selector", "resource-type", "exclude-resource-type"];

const THREADS: &[&str] = &["threads"];

/// Baseline deferral.
const DEFERRAL: &[&str] = &["defer", "no-defer", "favor-state", "no-favor-state", "state", "defer-state"];

const MATERIALIZING: &[&str] = &["full-refresh", "fail-fast", "empty"];

const TESTING: &[&str] = &["store-failures", "indirect-selection", "fail-fast"];

const OUTPUT: &[&str] = &["output", "output-keys", "inline", "limit", "show"];

const DEPENDENCIES: &[&str] = &["upgrade", "lock", "add-package", "source"];

const DOCS: &[&str] = &["no-compile", "empty-catalog", "static", "port", "host", "browser", "no-browser"];

pub const SUBCOMMAND_FLAGS: &[(&str, &[&[&str]])] = &[
    ("build", &[PROJECT, SELECTION, THREADS, DEFERRAL, MATERIALIZING, TESTING]),
    ("run", &[PROJECT, SELECTION, THREADS, DEFERRAL, MATERIALIZING]),
    ("test", &[PROJECT, SELECTION, THREADS, DEFERRAL, TESTING]),
    ("seed", &[PROJECT, SELECTION, THREADS, DEFERRAL, &["full-refresh", "show"]]),
    ("snapshot", &[PROJECT, SELECTION, THREADS, DEFERRAL]),
    ("compile", &[PROJECT, SELECTION, THREADS, DEFERRAL, OUTPUT]),
    ("show", &[PROJECT, SELECTION, THREADS, DEFERRAL, OUTPUT]),
    ("clone", &[PROJECT, SELECTION, THREADS, DEFERRAL, &["full-refresh"]]),
    ("retry", &[PROJECT, THREADS, &["state", "full-refresh"]]),
    ("ls", &[PROJECT, SELECTION, &["state", "output", "output-keys"]]),
    ("list", &[PROJECT, SELECTION, &["state", "output", "output-keys"]]),
    ("source", &[PROJECT, SELECTION, THREADS, &["output"]]),
    ("docs", &[PROJECT, SELECTION, THREADS, DEFERRAL, DOCS]),
    ("run-operation", &[PROJECT, &["args"]]),
    ("parse", &[PROJECT, THREADS]),
    ("deps", &[&["project-dir", "profiles-dir", "profile", "target", "vars"], DEPENDENCIES]),
    ("debug", &[&["project-dir", "profiles-dir", "profile", "target", "vars", "config-dir", "connection"]]),
    ("clean", &[&["project-dir", "profiles-dir", "profile", "target", "target-path", "vars", "clean-project-files-only"]]),
];

/// True when `subcommand` recognizes `--<flag>`.
pub fn accepts(subcommand: &str, flag: &str) -> bool {
    if GLOBAL_FLAGS.contains(&flag) {
        return true;
    }
    SUBCOMMAND_FLAGS
        .iter()
        .find(|(name, _)| *name == subcommand)
        .map_or(false, |(_, groups)| groups.iter().any(|group| group.contains(&flag)))
}

/// True when the table has a row for `subcommand`.
pub fn is_known(subcommand: &str) -> bool {
    SUBCOMMAND_FLAGS.iter().any(|(name, _)| *name == subcommand)
}
