//! Runs every target behind its own failure boundary and reports per target.
//!
//! Nothing a single target does can stop the run: read errors, path guard
//! violations and rule errors are printed and counted, then the next target
//! goes. Whether a dirty run fails the process is the caller's call, see
//! [`RunSummary::should_fail`].

use crate::patcher::{patch_file, PatchError, PatchOptions, PatchOutcome, PatchReport};
use crate::rule::RuleStatus;
use crate::safety::RootGuard;
use crate::targets::Target;
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::io::{self, Write};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub show_diff: bool,
}

/// Per-run tallies, one bucket per target plus unmatched rule count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub patched: usize,
    pub unchanged: usize,
    pub already_applied: usize,
    pub missing: usize,
    pub failed: usize,
    pub unmatched_rules: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.patched + self.unchanged + self.already_applied + self.missing + self.failed
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.missing == 0 && self.unmatched_rules == 0
    }

    /// Default runs always succeed; strict runs fail on anything unclean.
    pub fn should_fail(&self, strict: bool) -> bool {
        strict && !self.is_clean()
    }
}

fn evaluate(
    target: &Target,
    guard: &RootGuard,
    options: &PatchOptions,
) -> Result<PatchOutcome, PatchError> {
    let path = guard.resolve(&target.file)?;
    patch_file(target, &path, options)
}

/// Patch every target in order, printing a banner, one status line per
/// target and a closing summary to `out`.
pub fn run<W: Write>(
    targets: &[Target],
    guard: &RootGuard,
    options: &RunOptions,
    out: &mut W,
) -> io::Result<RunSummary> {
    writeln!(out, "{}", "Icon selection debug patcher".bold())?;
    writeln!(out, "Project root: {}", guard.project_root().display())?;
    if options.dry_run {
        writeln!(out, "{}", "[DRY RUN - no files will be written]".cyan())?;
    }
    writeln!(out)?;

    let patch_options = PatchOptions {
        dry_run: options.dry_run,
    };
    let mut summary = RunSummary::default();

    for target in targets {
        match evaluate(target, guard, &patch_options) {
            Ok(PatchOutcome::Patched(report)) => {
                report_patched(out, target, &report, options, &mut summary)?;
            }
            Ok(PatchOutcome::FileMissing { file, .. }) => {
                writeln!(
                    out,
                    "{} {}: File not found: {}",
                    "⚠".yellow(),
                    target.id,
                    file.display()
                )?;
                summary.missing += 1;
            }
            Err(e) => {
                warn!(target_id = %target.id, error = %e, "target failed");
                writeln!(out, "{} {}: Failed - {}", "✗".red(), target.id, e)?;
                summary.failed += 1;
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", "Summary:".bold())?;
    let verb = if options.dry_run { "would patch" } else { "patched" };
    writeln!(out, "  {} {}", format!("{}", summary.patched).green(), verb)?;
    writeln!(out, "  {} unchanged", summary.unchanged)?;
    writeln!(
        out,
        "  {} already applied",
        format!("{}", summary.already_applied).yellow()
    )?;
    writeln!(out, "  {} missing", format!("{}", summary.missing).yellow())?;
    writeln!(out, "  {} failed", format!("{}", summary.failed).red())?;
    if summary.unmatched_rules > 0 {
        writeln!(
            out,
            "  {} rule(s) did not find their anchor",
            format!("{}", summary.unmatched_rules).yellow()
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{}", "Done.".bold())?;

    Ok(summary)
}

fn report_patched<W: Write>(
    out: &mut W,
    target: &Target,
    report: &PatchReport,
    options: &RunOptions,
    summary: &mut RunSummary,
) -> io::Result<()> {
    let file = report.file.display();

    if report.changed() {
        let verb = if options.dry_run { "Would patch" } else { "Patched" };
        writeln!(out, "{} {}: {} {}", "✓".green(), target.id, verb, file)?;
        summary.patched += 1;
    } else if report.already_applied() {
        writeln!(out, "{} {}: Already applied to {}", "⊙".yellow(), target.id, file)?;
        summary.already_applied += 1;
    } else {
        writeln!(out, "{} {}: No changes to {}", "✓".green(), target.id, file)?;
        summary.unchanged += 1;
    }

    for rule in report.unmatched() {
        writeln!(out, "  {} {}: pattern not found", "⚠".yellow(), rule.rule)?;
        summary.unmatched_rules += 1;
    }

    if options.show_diff && report.changed() {
        display_diff(out, &report.file, &report.original, &report.patched)?;
    }

    Ok(())
}

/// Read-only report of every rule's status for every target.
pub fn status<W: Write>(targets: &[Target], guard: &RootGuard, out: &mut W) -> io::Result<RunSummary> {
    writeln!(out, "{}", "Patch Status Report".bold())?;
    writeln!(out, "Project root: {}", guard.project_root().display())?;
    writeln!(out)?;

    let mut summary = RunSummary::default();
    let check = PatchOptions { dry_run: true };

    for target in targets {
        match evaluate(target, guard, &check) {
            Ok(PatchOutcome::Patched(report)) => {
                writeln!(out, "{} ({})", target.id.as_str().bold(), report.file.display())?;
                for rule in &report.rules {
                    let mark = match rule.status {
                        RuleStatus::Applied => "○".cyan(),
                        RuleStatus::AlreadyApplied => "✓".green(),
                        RuleStatus::NotFound => "⚠".yellow(),
                    };
                    let label = match rule.status {
                        RuleStatus::Applied => "not applied".to_string(),
                        other => other.to_string(),
                    };
                    writeln!(out, "  {} {}: {}", mark, rule.rule, label)?;
                }
                if report.changed() {
                    summary.patched += 1;
                } else if report.already_applied() {
                    summary.already_applied += 1;
                } else {
                    summary.unchanged += 1;
                }
                summary.unmatched_rules += report.unmatched().count();
            }
            Ok(PatchOutcome::FileMissing { file, .. }) => {
                writeln!(out, "{} ({})", target.id.as_str().bold(), file.display())?;
                writeln!(out, "  {} file not found", "⚠".yellow())?;
                summary.missing += 1;
            }
            Err(e) => {
                writeln!(out, "{}", target.id.as_str().bold())?;
                writeln!(out, "  {} {}", "✗".red(), e)?;
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// Unified line diff between original and patched content.
fn display_diff<W: Write>(out: &mut W, file: &Path, original: &str, patched: &str) -> io::Result<()> {
    writeln!(out, "\n{}", format!("--- {} (original)", file.display()).dimmed())?;
    writeln!(out, "{}", format!("+++ {} (patched)", file.display()).dimmed())?;

    let diff = TextDiff::from_lines(original, patched);

    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        write!(out, "{}", line)?;
        if change.missing_newline() {
            writeln!(out)?;
        }
    }

    Ok(())
}
