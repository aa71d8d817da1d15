//! `arbor check`: structural validation of the stored board.

use super::{Context, open_board};
use crate::output::{pretty_section, render_mode};
use arbor_core::validate::{Violation, check_snapshot};
use clap::Args;
use serde::Serialize;
use tracing::warn;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Report problems but exit successfully.
    #[arg(long)]
    pub warn_only: bool,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    project: String,
    ok: bool,
    violations: Vec<Violation>,
}

pub fn run_check(args: &CheckArgs, ctx: &Context) -> anyhow::Result<()> {
    let repo = open_board(ctx)?;
    let violations = check_snapshot(&repo.load()?, &ctx.project);
    for violation in &violations {
        warn!(project = %ctx.project, %violation, "board violation");
    }

    let report = CheckReport {
        project: ctx.project.to_string(),
        ok: violations.is_empty(),
        violations,
    };
    render_mode(
        ctx.output,
        &report,
        |r, w| {
            for violation in &r.violations {
                writeln!(w, "{violation}")?;
            }
            Ok(())
        },
        |r, w| {
            if r.ok {
                return writeln!(w, "✓ {}: no problems found", r.project);
            }
            pretty_section(w, &format!("✗ {}: {} problem(s)", r.project, r.violations.len()))?;
            for violation in &r.violations {
                writeln!(w, "  {violation}")?;
            }
            Ok(())
        },
    )?;

    if !report.ok && !args.warn_only {
        anyhow::bail!("{} structural problem(s) found", report.violations.len());
    }
    Ok(())
}
