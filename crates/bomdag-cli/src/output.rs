//! Output layer: text and JSON renderings of orders, groups and statistics.
//!
//! Every renderer writes to a `&mut dyn Write` so the same code serves stdout
//! and the unit tests below.
//!
//! # Mode resolution
//!
//! Precedence (highest wins):
//! 1. `-g/--groups`, or `groups` from `-o` / config
//! 2. `dot`
//! 3. `order` (teardown order when `-r/--reverse` is set)
//!
//! In JSON mode a single object is written per invocation. When statistics
//! are requested they ride along under a `stats` key. DOT output is always
//! text.

use std::io::{self, Write};

use bomdag_core::config::ModeSetting;
use bomdag_core::{Bom, DeploymentGroup, DeploymentStep, GraphStats, SbomError};
use clap::ValueEnum;
use serde::Serialize;

/// What the main output section shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputMode {
    /// Step-by-step deployment (or teardown) order.
    #[default]
    Order,
    /// Parallel deployment groups.
    Groups,
    /// Graphviz DOT source.
    Dot,
}

impl From<ModeSetting> for OutputMode {
    fn from(setting: ModeSetting) -> Self {
        match setting {
            ModeSetting::Order => Self::Order,
            ModeSetting::Groups => Self::Groups,
            ModeSetting::Dot => Self::Dot,
        }
    }
}

/// Which end of the dependency chain comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sequence {
    Deploy,
    Teardown,
}

impl Sequence {
    #[must_use]
    pub const fn from_reverse(reverse: bool) -> Self {
        if reverse { Self::Teardown } else { Self::Deploy }
    }

    const fn heading(self) -> &'static str {
        match self {
            Self::Deploy => "=== Deployment Order ===",
            Self::Teardown => "=== Teardown Order ===",
        }
    }

    const fn intro(self) -> &'static str {
        match self {
            Self::Deploy => "Deploy components in this sequence:",
            Self::Teardown => "Remove/stop components in this sequence:",
        }
    }
}

/// The `--stats` summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub components: usize,
    pub dependencies: usize,
    pub roots: usize,
    pub format: String,
    pub spec_version: String,
}

impl StatsReport {
    #[must_use]
    pub fn new(stats: &GraphStats, bom: &Bom) -> Self {
        Self {
            components: stats.node_count,
            dependencies: stats.edge_count,
            roots: stats.root_count,
            format: bom.bom_format.clone(),
            spec_version: bom.spec_version.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderReport<'a> {
    pub mode: Sequence,
    pub steps: &'a [DeploymentStep],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<&'a StatsReport>,
}

#[derive(Debug, Serialize)]
pub struct GroupsReport<'a> {
    pub groups: &'a [DeploymentGroup],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<&'a StatsReport>,
}

/// Write `value` as pretty JSON followed by a newline.
pub fn write_json<T: Serialize>(w: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    writeln!(w)?;
    Ok(())
}

/// Write the statistics block and the blank line that separates it from the
/// main output.
pub fn write_stats(w: &mut dyn Write, stats: &StatsReport) -> io::Result<()> {
    writeln!(w, "=== Graph Statistics ===")?;
    writeln!(w, "Total Components: {}", stats.components)?;
    writeln!(w, "Total Dependencies: {}", stats.dependencies)?;
    writeln!(w, "Root Components: {}", stats.roots)?;
    writeln!(w, "SBOM Format: {} {}", stats.format, stats.spec_version)?;
    writeln!(w)
}

/// Write a deployment or teardown sequence, one `Step N:` block per step.
pub fn write_order(
    w: &mut dyn Write,
    sequence: Sequence,
    steps: &[DeploymentStep],
) -> io::Result<()> {
    writeln!(w, "{}", sequence.heading())?;
    writeln!(w, "{}", sequence.intro())?;
    writeln!(w)?;

    let mut current = 0;
    for entry in steps {
        if entry.step != current {
            if current > 0 {
                writeln!(w)?;
            }
            current = entry.step;
            writeln!(w, "Step {current}:")?;
        }
        writeln!(w, "  - {} (ref: {})", entry.name, entry.bom_ref)?;
    }
    Ok(())
}

/// Write parallel deployment groups separated by a down arrow.
pub fn write_groups(w: &mut dyn Write, groups: &[DeploymentGroup]) -> io::Result<()> {
    writeln!(w, "=== Deployment Groups ===")?;
    writeln!(w, "Components in the same group can be deployed in parallel:")?;
    writeln!(w)?;

    for (i, group) in groups.iter().enumerate() {
        writeln!(w, "Group {} (can deploy in parallel):", i + 1)?;
        for member in group {
            writeln!(w, "  - {member}")?;
        }
        if i + 1 < groups.len() {
            writeln!(w, "    ↓")?;
        }
    }
    Ok(())
}

/// Structured error payload for JSON mode and the `error:` line otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Stable `E####` code when the failure came from the library.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    /// Short description of the error class behind `code`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<&'static str>,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

impl From<&anyhow::Error> for CliError {
    fn from(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<SbomError>() {
            Some(sbom) => Self::from(sbom),
            None => Self {
                message: format!("{err:#}"),
                code: None,
                summary: None,
                hint: None,
            },
        }
    }
}

impl From<&SbomError> for CliError {
    fn from(err: &SbomError) -> Self {
        let code = err.code();
        Self {
            message: err.to_string(),
            code: Some(code.code()),
            summary: Some(code.message()),
            hint: code.hint(),
        }
    }
}

/// Render an error, as `{"error": {...}}` in JSON mode.
pub fn write_error(w: &mut dyn Write, json: bool, error: &CliError) -> anyhow::Result<()> {
    if json {
        let wrapper = serde_json::json!({ "error": error });
        return write_json(w, &wrapper);
    }

    match error.code {
        Some(code) => writeln!(w, "error[{code}]: {}", error.message)?,
        None => writeln!(w, "error: {}", error.message)?,
    }
    if let Some(hint) = error.hint {
        writeln!(w, "  hint: {hint}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(step: usize, name: &str, bom_ref: &str) -> DeploymentStep {
        DeploymentStep {
            step,
            name: name.into(),
            bom_ref: bom_ref.into(),
        }
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn order_groups_entries_by_step() {
        let steps = vec![
            step(1, "Component C", "comp-c"),
            step(1, "Cache", "cache"),
            step(2, "Component B", "comp-b"),
        ];
        let out = render(|w| write_order(w, Sequence::Deploy, &steps));
        assert_eq!(
            out,
            "=== Deployment Order ===\n\
             Deploy components in this sequence:\n\
             \n\
             Step 1:\n  - Component C (ref: comp-c)\n  - Cache (ref: cache)\n\
             \n\
             Step 2:\n  - Component B (ref: comp-b)\n"
        );
    }

    #[test]
    fn teardown_uses_its_own_heading() {
        let steps = vec![step(1, "A", "a")];
        let out = render(|w| write_order(w, Sequence::Teardown, &steps));
        assert!(out.starts_with("=== Teardown Order ===\nRemove/stop components in this sequence:\n"));
    }

    #[test]
    fn empty_order_prints_only_header() {
        let out = render(|w| write_order(w, Sequence::Deploy, &[]));
        assert_eq!(
            out,
            "=== Deployment Order ===\nDeploy components in this sequence:\n\n"
        );
    }

    #[test]
    fn groups_are_separated_by_arrows() {
        let groups = vec![vec!["C (1.0)".to_string()], vec!["B".to_string(), "D".to_string()]];
        let out = render(|w| write_groups(w, &groups));
        assert!(out.contains("Group 1 (can deploy in parallel):\n  - C (1.0)\n    ↓\n"));
        assert!(out.ends_with("Group 2 (can deploy in parallel):\n  - B\n  - D\n"));
        assert_eq!(out.matches('↓').count(), 1);
    }

    #[test]
    fn stats_block() {
        let stats = StatsReport {
            components: 3,
            dependencies: 2,
            roots: 1,
            format: "CycloneDX".into(),
            spec_version: "1.6".into(),
        };
        let out = render(|w| write_stats(w, &stats));
        assert_eq!(
            out,
            "=== Graph Statistics ===\nTotal Components: 3\nTotal Dependencies: 2\n\
             Root Components: 1\nSBOM Format: CycloneDX 1.6\n\n"
        );
    }

    #[test]
    fn order_report_json_shape() {
        let steps = vec![step(1, "A", "a")];
        let report = OrderReport {
            mode: Sequence::Teardown,
            steps: &steps,
            stats: None,
        };
        let value = serde_json::to_value(&report).expect("json");
        assert_eq!(value["mode"], "teardown");
        assert_eq!(value["steps"][0]["ref"], "a");
        assert_eq!(value["steps"][0]["step"], 1);
        assert!(value.get("stats").is_none());
    }

    #[test]
    fn sbom_errors_carry_code_and_hint() {
        let err = anyhow::Error::new(SbomError::InvalidFormat("SPDX".into()));
        let cli = CliError::from(&err);
        assert_eq!(cli.code, Some("E2002"));
        assert!(cli.hint.is_some());
        assert!(cli.message.contains("SPDX"));

        let mut buf = Vec::new();
        write_error(&mut buf, true, &cli).expect("write");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(value["error"]["code"], "E2002");
        assert_eq!(value["error"]["summary"], "Unsupported BOM format");
    }

    #[test]
    fn plain_errors_have_no_code() {
        let err = anyhow::anyhow!("boom");
        let cli = CliError::from(&err);
        assert_eq!(cli.code, None);
        assert_eq!(cli.summary, None);

        let mut buf = Vec::new();
        write_error(&mut buf, false, &cli).expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "error: boom\n");
    }
}
