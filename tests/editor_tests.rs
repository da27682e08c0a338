#![cfg(target_arch = "wasm32")]

use goalmap::{GraphSnapshot, MapMetadata, SharedMap};
use goalmap_wasm::GoalMapEditor;
use js_sys::Reflect;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn value(v: &JsValue) -> JsValue {
    assert_eq!(
        Reflect::get(v, &JsValue::from_str("ok")).unwrap().as_bool(),
        Some(true),
        "expected ok envelope"
    );
    Reflect::get(v, &JsValue::from_str("value")).unwrap()
}

fn graph(ed: &GoalMapEditor) -> GraphSnapshot {
    serde_wasm_bindgen::from_value(ed.graph()).unwrap()
}

fn add(ed: &mut GoalMapEditor, title: &str, x: f64) -> String {
    let data = serde_wasm_bindgen::to_value(&goalmap::NodeData::titled(title)).unwrap();
    value(&ed.add_node_res("goal", x, 0.0, data)).as_string().unwrap()
}

#[wasm_bindgen_test]
fn starts_with_default_map() {
    let ed = GoalMapEditor::in_memory(JsValue::UNDEFINED);
    assert_eq!(ed.active_map_id(), "default");
    let maps: Vec<MapMetadata> = serde_wasm_bindgen::from_value(ed.maps()).unwrap();
    assert_eq!(maps.len(), 1);
    assert_eq!(maps[0].name, "My Goal Map");
    assert!(graph(&ed).is_empty());
    assert!(!ed.can_undo());
}

#[wasm_bindgen_test]
fn in_memory_editor_installs_console_logging() {
    let _ed = GoalMapEditor::in_memory(JsValue::UNDEFINED);
    assert!(log::max_level() >= log::LevelFilter::Warn);
}

#[wasm_bindgen_test]
fn duplicate_delete_and_undo() {
    let mut ed = GoalMapEditor::in_memory(JsValue::UNDEFINED);
    let a = add(&mut ed, "Run", 0.0);
    let b = add(&mut ed, "Swim", 100.0);
    let conn = js_sys::JSON::parse(&format!(r#"{{"source":"{}","target":"{}","relationship":"leads-to"}}"#, a, b)).unwrap();
    value(&ed.connect_res(conn));

    ed.toggle_selection(&a);
    assert_eq!(value(&ed.duplicate_selected_res()).as_f64(), Some(3.0));
    let g = graph(&ed);
    assert_eq!(g.nodes[2].data.title, "Run (Copy)");
    assert_eq!(g.edges.len(), 1);

    value(&ed.delete_selected_res());
    let g = graph(&ed);
    assert_eq!(g.nodes.len(), 2);
    assert!(g.edges.is_empty(), "edge touching deleted node survived");
    assert!(!ed.has_selection());

    value(&ed.undo_res());
    assert_eq!(graph(&ed).edges.len(), 1);
    assert!(ed.can_redo());
}

#[wasm_bindgen_test]
fn drag_is_one_undo_step() {
    let mut ed = GoalMapEditor::in_memory(JsValue::UNDEFINED);
    let a = add(&mut ed, "Read", 0.0);
    ed.toggle_selection(&a);
    for _ in 0..10 {
        value(&ed.move_selected_res(1.0, 2.0));
    }
    assert!(ed.commit_move());
    assert!(!ed.commit_move());
    assert_eq!(graph(&ed).nodes[0].position.x, 10.0);
    value(&ed.undo_res());
    assert_eq!(graph(&ed).nodes[0].position.y, 0.0);
}

#[wasm_bindgen_test]
fn shortcuts_respect_text_focus() {
    let mut ed = GoalMapEditor::in_memory(JsValue::UNDEFINED);
    add(&mut ed, "A", 0.0);
    assert!(value(&ed.handle_key("a", true, false, false, false, true)).is_null());
    assert!(!ed.has_selection());

    let r = value(&ed.handle_key("a", false, true, false, false, false));
    let cmd = Reflect::get(&r, &JsValue::from_str("command")).unwrap();
    assert_eq!(cmd.as_string().as_deref(), Some("selectAll"));
    assert!(ed.has_selection());

    let r = value(&ed.handle_key("d", true, false, false, false, false));
    let effect = Reflect::get(&r, &JsValue::from_str("effect")).unwrap();
    assert_eq!(effect.as_string().as_deref(), Some("graph"));
    assert_eq!(graph(&ed).nodes.len(), 2);

    assert!(value(&ed.handle_key("q", false, false, false, false, false)).is_null());
}

#[wasm_bindgen_test]
fn switching_maps_saves_and_restores() {
    let mut ed = GoalMapEditor::in_memory(JsValue::UNDEFINED);
    add(&mut ed, "Home", 0.0);
    let other = value(&ed.create_map_res("Work", None)).as_string().unwrap();
    value(&ed.switch_map_res(&other));
    assert!(graph(&ed).is_empty());
    assert!(!ed.can_undo());

    value(&ed.switch_map_res("default"));
    assert_eq!(graph(&ed).nodes[0].data.title, "Home");

    value(&ed.delete_map_res("default"));
    assert_eq!(ed.active_map_id(), other);
    assert_eq!(ed.map_id(), other);
}

#[wasm_bindgen_test]
fn share_link_round_trip_and_import() {
    let mut ed = GoalMapEditor::in_memory(JsValue::UNDEFINED);
    add(&mut ed, "Japanisch lernen 日本語", 0.0);
    let link = value(&ed.share_link_res(Some("https://goals.example/".into())))
        .as_string()
        .unwrap();
    assert!(link.starts_with("https://goals.example/?shared="));
    assert!(link.ends_with("&view=true"));

    let found = value(&ed.shared_from_location(Some(link)));
    let view = Reflect::get(&found, &JsValue::from_str("viewOnly")).unwrap();
    assert_eq!(view.as_bool(), Some(true));
    let map: SharedMap =
        serde_wasm_bindgen::from_value(Reflect::get(&found, &JsValue::from_str("map")).unwrap()).unwrap();
    assert_eq!(map.name, "My Goal Map");

    let token = value(&ed.share_token_res()).as_string().unwrap();
    let id = value(&ed.import_shared_res(&token)).as_string().unwrap();
    assert_eq!(ed.active_map_id(), id);
    assert_eq!(graph(&ed).nodes[0].data.title, "Japanisch lernen 日本語");
}
