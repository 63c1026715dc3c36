//! Integration tests for browsing a loaded gamelist
//!
//! These tests verify:
//! - Folder navigation and the cursor stack over a parsed tree
//! - Grouping is stable across re-projection
//! - Kid mode and hidden entries
//! - Removing and sorting entries while browsing

use camino::Utf8Path;
use gamedeck::gamelist::{Category, ProjectionOptions, parse_gamelist};
use gamedeck::models::{DisplayFilter, EntryType, GameTree};
use gamedeck::{GameListView, ListProjector, SchemaRegistry};

const GAMELIST: &str = r#"<gameList>
  <game><path>./zelda.sfc</path><name>Zelda</name><favorite>true</favorite></game>
  <game><path>./mario.sfc</path><name>Mario</name><kidgame>true</kidgame></game>
  <game><path>./rpg/jrpg/ff6.sfc</path><name>Final Fantasy VI</name></game>
  <game><path>./rpg/jrpg/chrono.sfc</path><name>Chrono Trigger</name><favorite>true</favorite></game>
  <game><path>./rpg/earthbound.sfc</path><name>EarthBound</name></game>
  <game><path>./secret.sfc</path><name>Secret</name><hidden>true</hidden></game>
</gameList>"#;

fn load() -> GameTree {
    let registry = SchemaRegistry::builtin();
    parse_gamelist(GAMELIST, &registry, "snes", Utf8Path::new("/roms/snes")).unwrap()
}

fn id(tree: &GameTree, path: &str) -> gamedeck::EntryId {
    tree.find_by_path(&Utf8Path::new("/roms/snes").join(path)).unwrap()
}

fn labels(view: &GameListView) -> Vec<&str> {
    view.rows().iter().map(|r| r.label.as_str()).collect()
}

fn show_all() -> DisplayFilter {
    DisplayFilter {
        show_hidden: true,
        kid_mode: false,
    }
}

#[test]
fn test_root_rows_are_grouped() {
    let tree = load();
    let view = GameListView::new(&tree, ListProjector::default(), show_all());

    assert_eq!(labels(&view), vec!["#rpg", "★Zelda", "Mario", "Secret"]);
    let categories: Vec<Category> = view.rows().iter().map(|r| r.category).collect();
    assert_eq!(
        categories,
        vec![Category::Folder, Category::Favorite, Category::Normal, Category::Normal]
    );
}

#[test]
fn test_projection_is_deterministic() {
    let tree = load();
    let mut view = GameListView::new(&tree, ListProjector::default(), show_all());
    let first = view.rows().to_vec();

    view.populate(&tree, tree.root());
    assert_eq!(view.rows(), first.as_slice());
}

#[test]
fn test_navigate_into_nested_folders_and_back() {
    let tree = load();
    let rpg = id(&tree, "rpg");
    let jrpg = id(&tree, "rpg/jrpg");

    let mut view = GameListView::new(&tree, ListProjector::default(), show_all());
    assert_eq!(view.cursor(), Some(rpg));

    assert!(view.enter(&tree));
    assert_eq!(labels(&view), vec!["#jrpg", "EarthBound"]);
    assert!(view.enter(&tree));
    assert_eq!(labels(&view), vec!["★Chrono Trigger", "Final Fantasy VI"]);
    assert_eq!(view.cursor_stack(), &[rpg, jrpg]);

    assert!(view.back(&tree));
    assert_eq!(view.cursor(), Some(jrpg));
    assert!(view.back(&tree));
    assert_eq!(view.cursor(), Some(rpg));
    assert!(view.cursor_stack().is_empty());
}

#[test]
fn test_jump_to_deep_entry_rebuilds_stack() {
    let tree = load();
    let rpg = id(&tree, "rpg");
    let jrpg = id(&tree, "rpg/jrpg");
    let ff6 = id(&tree, "rpg/jrpg/ff6.sfc");

    let mut view = GameListView::new(&tree, ListProjector::default(), show_all());
    assert!(view.set_cursor(&tree, ff6));

    assert_eq!(view.current_folder(), jrpg);
    assert_eq!(view.cursor(), Some(ff6));
    assert_eq!(view.cursor_stack(), &[rpg, jrpg]);
}

#[test]
fn test_kid_mode_hides_other_games() {
    let tree = load();
    let filter = DisplayFilter {
        show_hidden: false,
        kid_mode: true,
    };
    let mut view = GameListView::new(&tree, ListProjector::default(), filter);

    assert_eq!(labels(&view), vec!["#rpg", "Mario"]);

    // rpg shows nothing in kid mode except its subfolder
    assert!(view.enter(&tree));
    assert_eq!(labels(&view), vec!["#jrpg"]);
    assert!(!view.enter(&tree));
}

#[test]
fn test_hidden_entries_need_show_hidden() {
    let tree = load();
    let view = GameListView::new(&tree, ListProjector::default(), DisplayFilter::default());
    assert!(!labels(&view).contains(&"Secret"));
}

#[test]
fn test_removing_every_game_leaves_placeholder() {
    let mut tree = load();
    let jrpg = id(&tree, "rpg/jrpg");
    let ff6 = id(&tree, "rpg/jrpg/ff6.sfc");
    let chrono = id(&tree, "rpg/jrpg/chrono.sfc");

    let projector = ListProjector::new(ProjectionOptions {
        placeholder_label: "nothing here".to_string(),
        ..ProjectionOptions::default()
    });
    let mut view = GameListView::new(&tree, projector, show_all());
    assert!(view.set_cursor(&tree, chrono));

    view.remove(&mut tree, chrono, false).unwrap();
    assert_eq!(view.cursor(), Some(ff6));
    view.remove(&mut tree, ff6, false).unwrap();

    assert_eq!(view.current_folder(), jrpg);
    assert_eq!(view.rows().len(), 1);
    assert_eq!(view.rows()[0].entry_type, EntryType::Placeholder);
    assert_eq!(view.rows()[0].label, "nothing here");
    assert_eq!(view.cursor(), None);
}

#[test]
fn test_sort_keeps_selection() {
    let mut tree = load();
    let mario = id(&tree, "mario.sfc");

    let projector = ListProjector::new(ProjectionOptions {
        favorites_first: false,
        ..ProjectionOptions::default()
    });
    let mut view = GameListView::new(&tree, projector, show_all());
    assert!(view.set_cursor(&tree, mario));

    view.sort(&mut tree);
    assert_eq!(labels(&view), vec!["#rpg", "Mario", "Secret", "★Zelda"]);
    assert_eq!(view.cursor(), Some(mario));
}
