//! Drives the lobby demo through a scripted session on a local host and
//! prints the document after every step.

mod config;
mod lobby;
mod logging;

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use engine_logging::{engine_info, engine_warn};
use serde_json::Value;
use trellis_core::{Action, NodeId};
use trellis_engine::{dispatch_event, start_with_config, Document, LocalHost, SharedDocument};

use config::TrellisAppConfig;
use lobby::LobbyFlags;

const DEFAULT_CONFIG: &str = "trellis_app.ron";
const MOUNT_ID: &str = "app";

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let loaded = config::load(&path)?;
    let config = loaded.clone().unwrap_or_default();
    logging::initialize(config.log_destination, config.verbose);
    if loaded.is_none() {
        engine_warn!("no config at {:?}; using defaults", path);
    }

    let document = mount_document();
    let host = Rc::new(LocalHost::with_document(Rc::clone(&document)));
    let seated = config.players.len();
    let TrellisAppConfig {
        room_code,
        players,
        runtime,
        ..
    } = config;
    let handle = start_with_config(
        lobby::app(),
        host.clone(),
        &format!("#{MOUNT_ID}"),
        LobbyFlags { room_code, players },
        runtime,
    )
    .context("mounting the lobby")?;

    host.run_pending_ticks();
    print_frame("lobby opened", &document);

    let input = find(&document, "input")?;
    document
        .borrow_mut()
        .set_property(input, "value", Value::String("Linus".into()));
    fire(&document, "input", "input")?;
    fire(&document, "form", "submit")?;
    print_frame("Linus joined", &document);

    for player in 1..=seated + 1 {
        fire(&document, &format!("#ready-{player}"), "click")?;
    }
    print_frame("everyone ready", &document);

    fire(&document, ".start", "click")?;
    print_frame("round started", &document);

    handle.send(Action::Shutdown);
    host.run_pending_ticks();
    print_frame("shut down", &document);
    engine_info!("demo finished");
    Ok(())
}

fn mount_document() -> SharedDocument {
    let mut doc = Document::new();
    let mount = doc.create_element("", "div");
    doc.set_attribute(mount, "id", MOUNT_ID);
    let body = doc.body();
    doc.append_child(body, mount);
    doc.into_shared()
}

fn find(document: &SharedDocument, selector: &str) -> Result<NodeId> {
    document
        .borrow()
        .query_selector(selector)
        .ok_or_else(|| anyhow!("nothing matches `{selector}`"))
}

fn fire(document: &SharedDocument, selector: &str, kind: &str) -> Result<()> {
    let target = find(document, selector)?;
    let handled = dispatch_event(document, target, kind, Value::Null);
    if handled == 0 {
        engine_warn!("`{}` on `{}` had no handler", kind, selector);
    }
    Ok(())
}

fn print_frame(label: &str, document: &SharedDocument) {
    let mut doc = document.borrow_mut();
    let stats = doc.stats();
    doc.reset_stats();
    println!("== {label} ({} mutations)", stats.total());
    println!("{}", doc.outer_html(doc.body()));
}
