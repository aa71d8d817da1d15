//! `arbor add`: append a new node to a sibling list.

use super::{Context, open_board};
use crate::output::{CliError, fail, pretty_kv, render};
use arbor_core::error::ErrorCode;
use arbor_core::model::{GroupRoot, ItemId, ItemKind, SiblingContext, WorkItem};
use arbor_core::order::{KeyAllocation, KeyClock, SystemKeyClock};
use arbor_core::repo::ItemRepository;
use arbor_core::tree::Scope;
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Title of the new item.
    #[arg(long)]
    pub title: String,

    /// Item kind: generic or group-root.
    #[arg(long, default_value = "generic")]
    pub kind: ItemKind,

    /// Nest under this item.
    #[arg(long, conflicts_with = "group")]
    pub parent: Option<String>,

    /// Add as a member of this group root.
    #[arg(long)]
    pub group: Option<String>,

    /// Store a group root in the legacy group-root collection.
    #[arg(long)]
    pub legacy: bool,
}

#[derive(Debug, Serialize)]
struct Added {
    id: ItemId,
    kind: ItemKind,
    context: SiblingContext,
    order_key: f64,
    legacy: bool,
}

/// Shortest unused `ar-` id derived from a blake3 hash of the new item.
fn generate_id(scope: &Scope, seed: &str) -> ItemId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(seed.as_bytes());
    let hex = hasher.finalize().to_hex();
    let hex = hex.as_str();

    (6..=hex.len())
        .map(|len| ItemId::new(format!("ar-{}", &hex[..len])))
        .find(|id| scope.get(id).is_none())
        .unwrap_or_else(|| ItemId::new(format!("ar-{hex}")))
}

pub fn run_add(args: &AddArgs, ctx: &Context) -> anyhow::Result<()> {
    let repo = open_board(ctx)?;
    let snapshot = repo.snapshot(&ctx.project)?;
    let scope = Scope::from_snapshot(&ctx.project, &snapshot);

    let is_group_root = args.kind == ItemKind::GroupRoot;
    if args.legacy && !is_group_root {
        return fail(
            ctx.output,
            &CliError::from_code(
                ErrorCode::InvalidMove,
                "--legacy only applies to --kind group-root",
            ),
        );
    }

    let context = match (&args.parent, &args.group) {
        (Some(parent), _) => SiblingContext::Parent(ItemId::new(parent.as_str())),
        (None, Some(group)) => SiblingContext::Group(ItemId::new(group.as_str())),
        (None, None) => SiblingContext::Root,
    };
    if is_group_root && !context.is_root() {
        return fail(
            ctx.output,
            &CliError::from_code(ErrorCode::InvalidMove, "group roots are always top-level"),
        );
    }
    if let Some(anchor) = context.anchor() {
        let Some(node) = scope.get(anchor) else {
            return fail(
                ctx.output,
                &CliError::from_code(ErrorCode::ItemNotFound, format!("item not found: '{anchor}'")),
            );
        };
        if matches!(context, SiblingContext::Group(_)) && !node.is_group_root() {
            return fail(
                ctx.output,
                &CliError::from_code(
                    ErrorCode::InvalidMove,
                    format!("'{anchor}' is not a group root"),
                ),
            );
        }
    }

    let now = Utc::now();
    let seed = format!(
        "{}\n{}\n{}\n{}",
        ctx.project,
        args.title,
        now.timestamp_nanos_opt().unwrap_or_default(),
        scope.len()
    );
    let id = generate_id(&scope, &seed);

    // Resume above every key on the board so a fresh key always sorts last.
    let mut clock = SystemKeyClock::resume_after(snapshot.max_order_key().unwrap_or(0.0));
    let siblings = scope.sibling_keys(&context, &id);
    let order_key = match ctx.config.ordering.allocator().append(&siblings, &id, &mut clock) {
        KeyAllocation::Key(key) => key,
        KeyAllocation::Renumber(_) => clock.next_key(),
    };
    debug!(%id, %context, order_key, "allocated key for new item");

    if args.legacy {
        repo.insert_group_root(GroupRoot {
            id: id.clone(),
            project_id: ctx.project.clone(),
            title: args.title.clone(),
            order_key: Some(order_key),
            created_at: now,
        })?;
    } else {
        let (parent_id, group_id) = context.pointers();
        repo.insert_item(WorkItem {
            id: id.clone(),
            project_id: ctx.project.clone(),
            title: args.title.clone(),
            kind: args.kind,
            parent_id,
            group_id,
            order_key: Some(order_key),
            created_at: now,
        })?;
    }
    info!(%id, kind = %args.kind, %context, "added item");

    let added = Added {
        id,
        kind: args.kind,
        context,
        order_key,
        legacy: args.legacy,
    };
    render(ctx.output, &added, |a, w| {
        writeln!(w, "✓ Added {}", a.id)?;
        pretty_kv(w, "kind", a.kind.to_string())?;
        pretty_kv(w, "context", a.context.to_string())?;
        pretty_kv(w, "order_key", a.order_key.to_string())
    })
}
