//! `arbor move`: apply a drop gesture from the command line.

use super::{Context, open_board};
use crate::output::{CliError, fail, pretty_kv, render};
use arbor_core::intent::MoveIntent;
use arbor_core::model::{ItemId, Placement, SiblingContext};
use arbor_core::mover::MoveExecutor;
use arbor_core::order::SystemKeyClock;
use arbor_core::repo::ItemRepository;
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Item being dragged.
    pub dragged: String,

    /// Item the drag is released over.
    pub target: String,

    /// Drop zone: before, after or inside.
    #[arg(long)]
    pub intent: MoveIntent,
}

#[derive(Debug, Serialize)]
struct Moved {
    ok: bool,
    id: ItemId,
    target: ItemId,
    intent: MoveIntent,
    context: SiblingContext,
    placement: Placement,
}

pub fn run_move(args: &MoveArgs, ctx: &Context) -> anyhow::Result<()> {
    let repo = open_board(ctx)?;
    // Empty sibling lists take clock keys; keep them above every stored key.
    let last_key = repo
        .snapshot(&ctx.project)?
        .max_order_key()
        .unwrap_or(0.0);

    let mut mover = MoveExecutor::new(
        repo,
        SystemKeyClock::resume_after(last_key),
        ctx.config.ordering.allocator(),
        ctx.project.clone(),
    );

    let dragged = ItemId::new(args.dragged.as_str());
    let target = ItemId::new(args.target.as_str());
    let placement = match mover.move_node(&dragged, &target, args.intent) {
        Ok(placement) => placement,
        Err(err) => return fail(ctx.output, &CliError::from(&err)),
    };

    let moved = Moved {
        ok: true,
        id: dragged,
        target,
        intent: args.intent,
        context: placement.context(),
        placement,
    };
    render(ctx.output, &moved, |m, w| {
        writeln!(w, "✓ {}: moved {} {}", m.id, m.intent, m.target)?;
        pretty_kv(w, "context", m.context.to_string())?;
        pretty_kv(w, "order_key", m.placement.order_key.to_string())
    })
}
