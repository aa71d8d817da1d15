//! `arbor classify`: report the drop zone for one pointer position.

use super::{Context, open_board};
use crate::output::{CliError, fail, pretty_kv, render};
use arbor_core::intent::{Bounds, DragDescriptor, DropZone, ZoneMode, classify_intent, zone_mode};
use arbor_core::model::ItemId;
use arbor_core::repo::ItemRepository;
use arbor_core::tree::Scope;
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Item being dragged.
    pub dragged: String,

    /// Item under the pointer.
    pub target: String,

    /// Top edge of the hovered row.
    #[arg(long, allow_negative_numbers = true)]
    pub top: f64,

    /// Height of the hovered row.
    #[arg(long)]
    pub height: f64,

    /// Vertical pointer position.
    #[arg(long, allow_negative_numbers = true)]
    pub pointer_y: f64,
}

#[derive(Debug, Serialize)]
struct Classification {
    dragged: DragDescriptor,
    target: DragDescriptor,
    mode: &'static str,
    zone: DropZone,
}

const fn mode_name(mode: ZoneMode) -> &'static str {
    match mode {
        ZoneMode::TwoZone => "two_zone",
        ZoneMode::ThreeZone => "three_zone",
    }
}

pub fn run_classify(args: &ClassifyArgs, ctx: &Context) -> anyhow::Result<()> {
    let repo = open_board(ctx)?;
    let scope = Scope::from_snapshot(&ctx.project, &repo.snapshot(&ctx.project)?);

    let describe = |raw: &str| DragDescriptor::from_scope(&scope, &ItemId::new(raw));
    let (dragged, target) = match (describe(&args.dragged), describe(&args.target)) {
        (Ok(dragged), Ok(target)) => (dragged, target),
        (Err(err), _) | (_, Err(err)) => return fail(ctx.output, &CliError::from(&err)),
    };

    let mode = zone_mode(
        dragged.kind,
        target.kind,
        dragged.context == target.context,
        target.is_top_level(),
    );
    let zone = classify_intent(
        Bounds::new(args.top, args.height),
        args.pointer_y,
        &dragged,
        &target,
    );

    let result = Classification {
        dragged,
        target,
        mode: mode_name(mode),
        zone,
    };
    render(ctx.output, &result, |c, w| {
        writeln!(w, "{}", c.zone)?;
        pretty_kv(w, "mode", c.mode)
    })
}
