//! `arbor tree`: depth-first render order of one project.

use super::{Context, open_board};
use crate::output::{OutputMode, Renderable, pretty_section, render_list};
use arbor_core::model::{Collection, ItemId, ItemKind, SiblingContext};
use arbor_core::repo::ItemRepository;
use arbor_core::tree::Scope;
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Hide the ids column in pretty output.
    #[arg(long)]
    pub no_ids: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub id: ItemId,
    pub level: usize,
    pub kind: ItemKind,
    pub collection: Collection,
    pub context: SiblingContext,
    pub order_key: Option<f64>,
    pub title: String,
    pub synthetic: bool,
    #[serde(skip)]
    show_id: bool,
}

impl Renderable for Row {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let indent = "  ".repeat(self.level);
        let marker = if self.kind == ItemKind::GroupRoot {
            "▣"
        } else {
            "•"
        };
        let orphan = if self.synthetic { " (orphaned)" } else { "" };
        if self.show_id {
            writeln!(w, "{indent}{marker} {}  {}{orphan}", self.id, self.title)
        } else {
            writeln!(w, "{indent}{marker} {}{orphan}", self.title)
        }
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self)?;
        writeln!(w)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let key = self.order_key.map(|k| k.to_string()).unwrap_or_default();
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.id, self.level, self.kind, self.context, key, self.title
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["id", "level", "kind", "context", "order_key", "title"]
    }
}

/// Flatten `scope` into display rows.
pub fn rows(scope: &Scope, show_id: bool) -> Vec<Row> {
    scope
        .render_order()
        .into_iter()
        .filter_map(|row| {
            let node = scope.get(&row.id)?;
            Some(Row {
                id: row.id,
                level: row.level,
                kind: node.kind,
                collection: node.collection,
                context: node.context.clone(),
                order_key: node.order_key,
                title: node.title.clone(),
                synthetic: row.synthetic,
                show_id,
            })
        })
        .collect()
}

pub fn run_tree(args: &TreeArgs, ctx: &Context) -> anyhow::Result<()> {
    let repo = open_board(ctx)?;
    let scope = Scope::from_snapshot(&ctx.project, &repo.snapshot(&ctx.project)?);
    let rows = rows(&scope, !args.no_ids);

    if ctx.output == OutputMode::Pretty {
        let mut out = io::stdout().lock();
        pretty_section(&mut out, &format!("{} ({} items)", ctx.project, rows.len()))?;
        if rows.is_empty() {
            writeln!(out, "(empty)")?;
            return Ok(());
        }
    }
    render_list(&rows, ctx.output)?;
    Ok(())
}
