use serde_json::{json, Value};

use super::*;
use crate::config::MemoryModeStore;
use crate::record::FieldPath;
use crate::router::EditOrigin;
use crate::schema;

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => panic!("not an object"),
    }
}

fn sample_records() -> Vec<Record> {
    vec![
        record(json!({"id": 1, "name": "Alice", "items": [{"q": 1}, {"q": 2}], "meta": {"k": 1}})),
        record(json!({"id": 2, "name": "Bob", "items": []})),
        record(json!({"id": 3, "name": "Cara", "items": [{"q": 3}]})),
    ]
}

/// A grid that has received init and every row
fn loaded_grid(config: &Config) -> GridModel {
    let records = sample_records();
    let mut grid = GridModel::new(config);
    grid.handle(HostMessage::Init {
        columns: schema::analyze(&records),
        total_rows: records.len(),
    });
    grid.handle(HostMessage::DataChunk { start_index: 0, rows: records });
    grid
}

fn ids(grid: &GridModel) -> Vec<String> {
    grid.display_rows().iter().map(|r| r.row_id()).collect()
}

fn grid_edit(display_row: usize, column: &str, new_value: Value) -> CellEditEvent {
    CellEditEvent {
        origin: EditOrigin::Grid { display_row },
        column: column.to_string(),
        old_value: Value::Null,
        new_value,
    }
}

// === Loading ===

#[test]
fn test_chunks_request_until_complete() {
    let records = sample_records();
    let config = Config { chunk_size: 2, ..Config::default() };
    let mut grid = GridModel::new(&config);
    grid.handle(HostMessage::Init { columns: schema::analyze(&records), total_rows: 3 });

    let out = grid.handle(HostMessage::DataChunk { start_index: 0, rows: records[..2].to_vec() });
    assert_eq!(out, vec![RendererMessage::RequestChunk { start_index: 2, count: 2 }]);
    assert!(!grid.is_fully_loaded());

    let out = grid.handle(HostMessage::DataChunk { start_index: 2, rows: records[2..].to_vec() });
    assert!(out.is_empty());
    assert!(grid.is_fully_loaded());
    assert_eq!(grid.display_rows().len(), 3);
}

#[test]
fn test_empty_chunk_stops_requests() {
    let mut grid = GridModel::new(&Config::default());
    grid.handle(HostMessage::Init { columns: Vec::new(), total_rows: 10 });
    assert!(grid.handle(HostMessage::DataChunk { start_index: 0, rows: Vec::new() }).is_empty());
}

#[test]
fn test_init_clears_expansions_and_rows() {
    let config = Config { panel_mode: PanelMode::Modal, ..Config::default() };
    let mut grid = loaded_grid(&config);
    grid.toggle_inline(0, "items");
    grid.click_subtable(2, "items");
    assert!(grid.expansion().has_expansions());

    grid.handle(HostMessage::Init { columns: Vec::new(), total_rows: 0 });
    assert!(!grid.expansion().has_expansions());
    assert!(grid.display_rows().is_empty());
    assert_eq!(grid.loaded_rows(), 0);
}

#[test]
fn test_theme_changed() {
    let mut grid = loaded_grid(&Config::default());
    grid.handle(HostMessage::ThemeChanged { theme: Theme::Dark });
    assert_eq!(grid.theme(), Theme::Dark);
}

// === Editing ===

#[test]
fn test_edit_after_expansion_maps_to_record() {
    let mut grid = loaded_grid(&Config::default());
    grid.toggle_inline(0, "items");
    assert_eq!(ids(&grid), vec!["0", "detail-0:items", "1", "2"]);

    // Display row 2 is record 1
    let msg = grid.edit_cell(grid_edit(2, "name", json!("Robert"))).unwrap();
    match msg {
        RendererMessage::CellEdit { edit } => {
            assert_eq!(edit.row_index, 1);
            assert_eq!(edit.field, FieldPath::field("name"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(grid.record(1).unwrap()["name"], json!("Robert"));
}

#[test]
fn test_edit_number_column_parses() {
    let mut grid = loaded_grid(&Config::default());
    grid.edit_cell(grid_edit(0, "id", json!("7"))).unwrap();
    assert_eq!(grid.record(0).unwrap()["id"], json!(7));
}

#[test]
fn test_flat_row_edit_updates_nested_value() {
    let mut grid = loaded_grid(&Config::default());
    grid.toggle_flat(0, "items");
    assert_eq!(ids(&grid), vec!["0", "flat-0:items:0", "flat-0:items:1", "1", "2"]);

    let msg = grid.edit_cell(grid_edit(2, "q", json!(20))).unwrap();
    assert!(matches!(msg, RendererMessage::CellEdit { edit } if edit.field.to_string() == "items[1].q"));
    assert_eq!(grid.record(0).unwrap()["items"][1]["q"], json!(20));

    // Flat rows are rebuilt from the refreshed snapshot
    match &grid.display_rows()[2] {
        DisplayRow::Flat { values, .. } => assert_eq!(values["q"], json!(20)),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_flat_row_parent_columns_not_routed() {
    let mut grid = loaded_grid(&Config::default());
    grid.toggle_flat(0, "items");

    assert!(grid.is_cell_editable(1, "q"));
    assert!(!grid.is_cell_editable(1, "id"));
    assert!(!grid.is_cell_editable(1, "items"));
    assert!(grid.edit_cell(grid_edit(1, "id", json!("zz"))).is_none());
    assert!(grid.edit_cell(grid_edit(1, "name", json!("xx"))).is_none());
    assert_eq!(grid.record(0).unwrap()["items"][0], json!({"q": 1}));

    grid.edit_cell(grid_edit(1, "q", json!("9"))).unwrap();
    assert_eq!(grid.record(0).unwrap()["items"][0]["q"], json!(9));
}

#[test]
fn test_non_editable_cells() {
    let mut grid = loaded_grid(&Config::default());
    grid.toggle_inline(0, "items");

    assert!(grid.is_cell_editable(0, "name"));
    assert!(!grid.is_cell_editable(0, "items"));
    assert!(!grid.is_cell_editable(0, "meta"));
    assert!(!grid.is_cell_editable(1, "name"));
    assert!(grid.edit_cell(grid_edit(1, "name", json!("x"))).is_none());
    assert!(grid.edit_cell(grid_edit(0, "meta", json!("x"))).is_none());
}

#[test]
fn test_panel_edit_refreshes_panel() {
    let config = Config { panel_mode: PanelMode::Docked, ..Config::default() };
    let mut grid = loaded_grid(&config);
    grid.click_subtable(0, "items");

    let event = CellEditEvent {
        origin: EditOrigin::Subtable { parent: 0, field: "items".into(), sub_index: 0 },
        column: "q".into(),
        old_value: json!(1),
        new_value: json!(100),
    };
    grid.edit_cell(event).unwrap();
    let panel = grid.expansion().active_panel().unwrap();
    assert_eq!(panel.data[0]["q"], json!(100));
}

#[test]
fn test_apply_edit_from_host() {
    let mut grid = loaded_grid(&Config::default());
    let edit = CellEdit::new(2, FieldPath::field("name"), json!("Cara"), json!("Carla"));
    grid.handle(HostMessage::ApplyEdit { edit });
    assert_eq!(grid.record(2).unwrap()["name"], json!("Carla"));

    // Rows that never arrived are ignored
    let edit = CellEdit::new(9, FieldPath::field("name"), Value::Null, json!("x"));
    assert!(grid.handle(HostMessage::ApplyEdit { edit }).is_empty());
}

// === Expansion ===

#[test]
fn test_detail_row_height() {
    assert_eq!(detail_row_height(0), 120);
    assert_eq!(detail_row_height(5), 168);
    assert_eq!(detail_row_height(50), 300);

    let mut grid = loaded_grid(&Config::default());
    grid.toggle_inline(0, "items");
    assert_eq!(grid.row_height(1), Some(120));
    assert_eq!(grid.row_height(0), None);
}

#[test]
fn test_expand_all_flat_widens_columns() {
    let mut grid = loaded_grid(&Config::default());
    assert_eq!(grid.column_width("items"), Some(120));

    assert!(grid.expand_all_flat());
    assert_eq!(grid.column_width("items"), Some(360));
    assert_eq!(grid.display_rows().len(), 6);

    assert!(!grid.expand_all_flat());
    assert_eq!(grid.column_width("items"), Some(120));
    assert_eq!(grid.display_rows().len(), 3);
}

#[test]
fn test_expand_all_inline_restores_widths() {
    let mut grid = loaded_grid(&Config::default());
    grid.expand_all_flat();
    assert!(grid.expand_all_inline());
    assert_eq!(grid.column_width("items"), Some(120));
    assert_eq!(ids(&grid), vec!["0", "detail-0:items", "1", "2", "detail-2:items"]);
}

#[test]
fn test_expand_all_without_subtables() {
    let records = vec![record(json!({"a": 1}))];
    let mut grid = GridModel::new(&Config::default());
    grid.handle(HostMessage::Init { columns: schema::analyze(&records), total_rows: 1 });
    grid.handle(HostMessage::DataChunk { start_index: 0, rows: records });

    assert!(!grid.expand_all_inline());
    assert!(!grid.expand_all_flat());
    assert_eq!(grid.display_rows().len(), 1);
}

#[test]
fn test_mode_store_round_trip() {
    let store = MemoryModeStore::new(Some(PanelMode::Flat));
    let mut grid = GridModel::new(&Config::default()).with_mode_store(Box::new(store.clone()));
    assert_eq!(grid.mode(), PanelMode::Flat);

    grid.set_mode(PanelMode::Docked);
    assert_eq!(store.load(), Some(PanelMode::Docked));
}

#[test]
fn test_panel_switch_persists_mode() {
    let store = MemoryModeStore::default();
    let config = Config { panel_mode: PanelMode::Modal, ..Config::default() };
    let records = sample_records();
    let mut grid = GridModel::new(&config).with_mode_store(Box::new(store.clone()));
    grid.handle(HostMessage::Init { columns: schema::analyze(&records), total_rows: 3 });
    grid.handle(HostMessage::DataChunk { start_index: 0, rows: records });

    assert_eq!(grid.click_subtable(0, "items"), ClickOutcome::Expanded(PanelMode::Modal));
    assert_eq!(grid.cycle_panel_mode(), Some(PanelMode::Docked));
    assert_eq!(store.load(), Some(PanelMode::Docked));
    assert_eq!(grid.cycle_panel_mode(), Some(PanelMode::Inline));
    assert_eq!(store.load(), Some(PanelMode::Inline));
    assert_eq!(ids(&grid), vec!["0", "detail-0:items", "1", "2"]);
}

#[test]
fn test_flat_row_switch_to_modal() {
    let mut grid = loaded_grid(&Config { panel_mode: PanelMode::Flat, ..Config::default() });
    grid.click_subtable(2, "items");
    assert_eq!(ids(&grid), vec!["0", "1", "2", "flat-2:items:0"]);

    grid.switch_presentation(2, "items", PanelMode::Modal);
    assert_eq!(ids(&grid), vec!["0", "1", "2"]);
    assert_eq!(grid.mode(), PanelMode::Modal);
    assert!(grid.expansion().is_panel_open(&ExpansionKey::new(2, "items")));
}

// === Columns and search ===

#[test]
fn test_column_visibility_and_info_bar() {
    let mut grid = loaded_grid(&Config::default());
    assert_eq!(grid.info_bar().row_text(), "Rows: 3");
    assert_eq!(grid.info_bar().col_text(), "Cols: 4");

    grid.set_column_visible("meta", false);
    assert!(!grid.is_column_visible("meta"));
    assert_eq!(grid.visible_fields(), vec!["id", "name", "items"]);
    assert_eq!(grid.info_bar().col_text(), "Cols: 3 / 4");

    grid.hide_all_columns();
    assert!(grid.visible_fields().is_empty());
    grid.reset_column_visibility();
    assert_eq!(grid.visible_fields().len(), 4);
}

#[test]
fn test_hidden_columns_survive_init() {
    let mut grid = loaded_grid(&Config::default());
    grid.set_column_visible("name", false);
    let records = sample_records();
    grid.handle(HostMessage::Init { columns: schema::analyze(&records), total_rows: 3 });
    assert!(!grid.is_column_visible("name"));
}

#[test]
fn test_search_tracks_display_positions() {
    let mut grid = loaded_grid(&Config::default());
    grid.toggle_inline(0, "items");
    assert_eq!(grid.search("cara"), 1);
    assert_eq!(grid.search_next().unwrap().display_row, 3);
    assert_eq!(grid.search_status(), "1 / 1");

    // Collapsing shifts rows; matches follow
    grid.toggle_inline(0, "items");
    assert_eq!(grid.search_next().unwrap().display_row, 2);
}

#[test]
fn test_search_position_survives_expansion() {
    let mut grid = loaded_grid(&Config::default());
    assert_eq!(grid.search("a"), 2);
    assert_eq!(grid.search_next().unwrap().display_row, 2);
    assert_eq!(grid.search_status(), "2 / 2");

    grid.toggle_inline(0, "items");
    assert_eq!(grid.search_status(), "2 / 2");
    assert_eq!(grid.search_prev().unwrap().display_row, 0);
    assert_eq!(grid.search_next().unwrap().display_row, 3);
}

#[test]
fn test_search_ignores_hidden_columns() {
    let mut grid = loaded_grid(&Config::default());
    grid.set_column_visible("name", false);
    assert_eq!(grid.search("alice"), 0);
    assert_eq!(grid.search_status(), "No matches");
}
