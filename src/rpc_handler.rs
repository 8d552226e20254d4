//! RPC method handler for the Linkboard JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches a call to the board model, the drag session or
//! the persistence gateway held by `App`.

use std::sync::Mutex;

use crate::app::App;
use crate::managers::layout_model::LayoutModelTrait;
use crate::managers::trash_manager::{TrashManager, TrashManagerTrait};
use crate::services::persistence_gateway::PersistenceGatewayTrait;
use crate::services::seed_import;
use crate::types::board::{Link, Section};
use crate::types::drag::{CancelReason, DragItem, DropSurface};
use crate::types::geometry::{Point, Rect};
use crate::types::ids::{ColumnId, LinkId, SectionId};
use crate::types::snapshot::BoardData;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// Encode bytes to base64 string.
pub fn base64_encode(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Decode base64 string to bytes.
pub fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    BASE64.decode(input).map_err(|e| format!("base64 decode error: {}", e))
}

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

/// Insertion slot; absent means "append".
fn index_param(params: &Value) -> usize {
    params
        .get("index")
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .unwrap_or(usize::MAX)
}

fn typed_param<T: DeserializeOwned>(params: &Value, key: &str) -> Result<T, String> {
    let raw = params.get(key).cloned().ok_or_else(|| format!("missing {}", key))?;
    serde_json::from_value(raw).map_err(|e| format!("invalid {}: {}", key, e))
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        // ─── Board ───
        "board.get" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(BoardData::from_state(a.model.state())).map_err(|e| e.to_string())
        }
        "board.stats" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(a.model.state().stats()).map_err(|e| e.to_string())
        }
        "board.export" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            let bytes = a.export().map_err(|e| e.to_string())?;
            Ok(json!({"data": base64_encode(&bytes)}))
        }
        "board.import" => {
            let bytes = base64_decode(str_param(params, "data")?)?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let stats = a.import(&bytes).map_err(|e| e.to_string())?;
            serde_json::to_value(stats).map_err(|e| e.to_string())
        }
        "board.seed" => {
            let raw = params.get("links").ok_or("missing links")?;
            let bytes = serde_json::to_vec(raw).map_err(|e| e.to_string())?;
            let records = seed_import::parse_records(&bytes).map_err(|e| e.to_string())?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(a.seed(records)).map_err(|e| e.to_string())
        }

        // ─── Sections ───
        "section.add" => {
            let title = str_param(params, "title")?;
            let icon = params.get("icon").and_then(|v| v.as_str()).unwrap_or("");
            let column = ColumnId::from(str_param(params, "column")?);
            let index = index_param(params);
            let section = Section::new(title, icon);
            let id = section.id.clone();
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.mutate(|m| m.add_section(section, &column, index)).map_err(|e| e.to_string())?;
            Ok(json!({"id": id}))
        }
        "section.remove" => {
            let id = SectionId::from(str_param(params, "id")?);
            let relocate = params.get("relocate_to").and_then(|v| v.as_str()).map(SectionId::from);
            let with_links = params.get("with_links").and_then(|v| v.as_bool()).unwrap_or(false);
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let result = if with_links {
                a.mutate(|m| m.remove_section_with_links(&id))
            } else {
                a.mutate(|m| m.remove_section(&id, relocate.as_ref()))
            };
            let removed = result.map_err(|e| e.to_string())?;
            Ok(json!({"id": removed.id, "links": removed.links.len()}))
        }
        "section.move" => {
            let id = SectionId::from(str_param(params, "id")?);
            let column = ColumnId::from(str_param(params, "column")?);
            let index = index_param(params);
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.mutate(|m| m.move_section(&id, &column, index)).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "section.rename" => {
            let id = SectionId::from(str_param(params, "id")?);
            let title = params.get("title").and_then(|v| v.as_str());
            let icon = params.get("icon").and_then(|v| v.as_str());
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.mutate(|m| m.rename_section(&id, title, icon)).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Links ───
        "link.add" => {
            let url = str_param(params, "url")?;
            let title = params.get("title").and_then(|v| v.as_str()).unwrap_or("");
            let section = SectionId::from(str_param(params, "section")?);
            let index = index_param(params);
            let mut link = Link::new(title, url);
            link.metadata = params.get("metadata").cloned();
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let id = a.mutate(|m| m.add_link(link, &section, index)).map_err(|e| e.to_string())?;
            Ok(json!({"id": id}))
        }
        "link.move" => {
            let id = LinkId::from(str_param(params, "id")?);
            let section = SectionId::from(str_param(params, "section")?);
            let index = index_param(params);
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.mutate(|m| m.move_link(&id, &section, index)).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "link.update" => {
            let id = LinkId::from(str_param(params, "id")?);
            let title = params.get("title").and_then(|v| v.as_str());
            let url = params.get("url").and_then(|v| v.as_str());
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.mutate(|m| m.update_link(&id, title, url)).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "link.updateTitle" => {
            let id = LinkId::from(str_param(params, "id")?);
            let title = str_param(params, "title")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.mutate(|m| m.update_link_title(&id, title)).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "link.delete" => {
            let id = LinkId::from(str_param(params, "id")?);
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.mutate(|m| m.delete_link(&id)).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Trash ───
        "trash.list" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(a.model.trash()).map_err(|e| e.to_string())
        }
        "trash.restore" => {
            let id = LinkId::from(str_param(params, "id")?);
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let section = a
                .mutate(|m| TrashManager::new(m).restore(&id))
                .map_err(|e| e.to_string())?;
            Ok(json!({"section": section}))
        }
        "trash.purge" => {
            let id = LinkId::from(str_param(params, "id")?);
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.mutate(|m| TrashManager::new(m).purge(&id)).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "trash.purgeAll" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let purged = a
                .mutate(|m| Ok(TrashManager::new(m).purge_all()))
                .map_err(|e| e.to_string())?;
            Ok(json!({"purged": purged}))
        }

        // ─── Drag ───
        "drag.down" => {
            let item: DragItem = typed_param(params, "item")?;
            let pointer: Point = typed_param(params, "pointer")?;
            let bounds: Rect = typed_param(params, "bounds")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let started = a.pointer_down(item, pointer, bounds).map_err(|e| e.to_string())?;
            Ok(json!({"accepted": started}))
        }
        "drag.move" => {
            let pointer: Point = typed_param(params, "pointer")?;
            let surface: DropSurface = match params.get("surface") {
                Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| format!("invalid surface: {}", e))?,
                None => DropSurface::default(),
            };
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let view = a.pointer_move(pointer, &surface);
            Ok(json!({"view": view}))
        }
        "drag.up" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let outcome = a.pointer_up().map_err(|e| e.to_string())?;
            serde_json::to_value(outcome).map_err(|e| e.to_string())
        }
        "drag.cancel" => {
            let reason = match params.get("reason") {
                Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| format!("invalid reason: {}", e))?,
                None => CancelReason::Escape,
            };
            let mut a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"cancelled": a.cancel_drag(reason)}))
        }

        // ─── Preferences ───
        "preferences.get" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(a.model.preferences()).map_err(|e| e.to_string())
        }
        "preferences.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.mutate(|m| m.set_preference(key, value)).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Persistence ───
        "persistence.flush" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let written = a.flush().map_err(|e| e.to_string())?;
            Ok(json!({"written": written}))
        }
        "backups.list" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            let backups = a.persistence.list_backups().map_err(|e| e.to_string())?;
            serde_json::to_value(backups).map_err(|e| e.to_string())
        }
        "backups.restore" => {
            let id = str_param(params, "id")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.restore_backup(id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        "ping" => Ok(json!({"pong": true})),

        _ => Err(format!("unknown method: {}", method)),
    }
}
