//! Unit tests for the DragController state machine: click vs drag, commits
//! through the layout model, cancellation and lifecycle hooks.

use std::cell::RefCell;
use std::rc::Rc;

use linkboard::managers::drag_controller::{
    DragController, DragControllerTrait, DragObserver, DragState,
};
use linkboard::managers::layout_model::{LayoutModel, LayoutModelTrait};
use linkboard::types::board::{Link, Section};
use linkboard::types::drag::{
    CancelReason, Candidate, DragCommit, DragItem, DragOutcome, DropContainer, DropSurface,
    Placeholder,
};
use linkboard::types::errors::{DragError, LayoutError};
use linkboard::types::geometry::{Flow, Point, Rect};
use linkboard::types::ids::{ColumnId, LinkId, SectionId};

const ROW: f64 = 40.0;

fn sid(id: &str) -> SectionId {
    SectionId::from(id)
}

fn lid(id: &str) -> LinkId {
    LinkId::from(id)
}

fn col(n: usize) -> ColumnId {
    ColumnId::from(format!("col-{}", n))
}

fn section(id: &str) -> Section {
    Section {
        id: sid(id),
        title: id.to_string(),
        icon: String::new(),
        links: Vec::new(),
    }
}

fn link(id: &str) -> Link {
    Link {
        id: lid(id),
        ..Link::new(id, &format!("https://example.com/{}", id))
    }
}

/// Column 1 holds sections `a`, `b`, `c`; section `a` holds links `l1`..`l5`.
fn board() -> LayoutModel {
    let mut model = LayoutModel::default();
    for id in ["a", "b", "c"] {
        model.add_section(section(id), &col(1), usize::MAX).unwrap();
    }
    for id in ["l1", "l2", "l3", "l4", "l5"] {
        model.add_link(link(id), &sid("a"), usize::MAX).unwrap();
    }
    model
}

fn row_bounds(x: f64, i: usize) -> Rect {
    Rect::new(x, i as f64 * ROW, 200.0, ROW)
}

/// Renders one container per current section / column, items stacked in rows.
fn surface(model: &LayoutModel) -> DropSurface {
    let mut surface = DropSurface::default();
    for (ci, column) in model.state().layout.columns.iter().enumerate() {
        let x = ci as f64 * 300.0;
        surface.columns.push(DropContainer {
            id: column.id.clone(),
            bounds: Rect::new(x, 0.0, 200.0, 1000.0),
            flow: Flow::Vertical,
            items: column
                .section_ids
                .iter()
                .enumerate()
                .map(|(i, id)| Candidate { id: id.clone(), bounds: row_bounds(x, i) })
                .collect(),
        });
    }
    for (si, section) in model.state().sections.values().enumerate() {
        let x = 1000.0 + si as f64 * 300.0;
        surface.sections.push(DropContainer {
            id: section.id.clone(),
            bounds: Rect::new(x, 0.0, 200.0, 1000.0),
            flow: Flow::Vertical,
            items: section
                .links
                .iter()
                .enumerate()
                .map(|(i, l)| Candidate { id: l.id.clone(), bounds: row_bounds(x, i) })
                .collect(),
        });
    }
    surface
}

/// Left edge of the rendered container for section `id`.
fn section_x(surface: &DropSurface, id: &str) -> f64 {
    surface
        .sections
        .iter()
        .find(|c| c.id == sid(id))
        .map(|c| c.bounds.x)
        .unwrap()
}

fn link_order(model: &LayoutModel, section: &str) -> Vec<String> {
    model
        .section(&sid(section))
        .unwrap()
        .links
        .iter()
        .map(|l| l.id.to_string())
        .collect()
}

fn column_order(model: &LayoutModel, n: usize) -> Vec<String> {
    model
        .column_sections(&col(n))
        .unwrap()
        .iter()
        .map(|id| id.to_string())
        .collect()
}

/// Records hook calls as strings.
struct Recorder(Rc<RefCell<Vec<String>>>);

impl DragObserver for Recorder {
    fn on_drag_start(&mut self, item: &DragItem) {
        self.0.borrow_mut().push(format!("start {:?}", item));
    }
    fn on_drag_commit(&mut self, commit: &DragCommit) {
        self.0.borrow_mut().push(format!("commit {:?}", commit));
    }
    fn on_drag_cancel(&mut self, _item: &DragItem, reason: CancelReason) {
        self.0.borrow_mut().push(format!("cancel {:?}", reason));
    }
}

/// Presses on section `id` in column 1 at its row center.
fn press_section(ctl: &mut DragController, model: &LayoutModel, id: &str, row: usize) -> Point {
    let bounds = row_bounds(0.0, row);
    let start = bounds.center();
    ctl.pointer_down(model, DragItem::Section(sid(id)), start, bounds).unwrap();
    start
}

/// Presses on link `id` in section `a` at its row center.
fn press_link(ctl: &mut DragController, model: &LayoutModel, surface: &DropSurface, id: &str, row: usize) -> Point {
    let bounds = row_bounds(section_x(surface, "a"), row);
    let start = bounds.center();
    ctl.pointer_down(model, DragItem::Link(lid(id)), start, bounds).unwrap();
    start
}

// ─── Click vs drag ───

#[test]
fn test_release_without_movement_is_a_click() {
    let mut model = board();
    let before = model.serialize();
    let mut ctl = DragController::new();

    press_section(&mut ctl, &model, "b", 1);
    let outcome = ctl.pointer_up(&mut model).unwrap();

    assert_eq!(outcome, DragOutcome::Click { item: DragItem::Section(sid("b")) });
    assert!(ctl.is_idle());
    assert_eq!(model.serialize(), before);
}

#[test]
fn test_small_jitter_stays_pending() {
    let model = board();
    let surface = surface(&model);
    let mut ctl = DragController::new();

    let start = press_section(&mut ctl, &model, "b", 1);
    assert!(ctl.pointer_move(Point::new(start.x + 3.0, start.y + 3.0), &surface).is_none());
    assert!(matches!(ctl.state(), DragState::Pending { .. }));
}

#[test]
fn test_release_when_idle_reports_idle() {
    let mut model = board();
    let mut ctl = DragController::new();
    assert_eq!(ctl.pointer_up(&mut model).unwrap(), DragOutcome::Idle);
    assert!(!ctl.cancel(CancelReason::Escape));
}

// ─── Section drags ───

#[test]
fn test_drag_section_to_end_of_column() {
    let mut model = board();
    let surface = surface(&model);
    let mut ctl = DragController::new();

    let start = press_section(&mut ctl, &model, "b", 1);
    let view = ctl
        .pointer_move(Point::new(start.x, 500.0), &surface)
        .cloned()
        .expect("drag should start");
    assert_eq!(view.suppressed, DragItem::Section(sid("b")));
    assert_eq!(view.placeholder, Placeholder::Section { column: col(1), before: None });

    let outcome = ctl.pointer_up(&mut model).unwrap();
    assert!(matches!(outcome, DragOutcome::Committed { .. }));
    assert_eq!(column_order(&model, 1), vec!["a", "c", "b"]);
    assert!(ctl.is_idle());
}

#[test]
fn test_drag_section_to_front_of_column() {
    let mut model = board();
    let surface = surface(&model);
    let mut ctl = DragController::new();

    press_section(&mut ctl, &model, "c", 2);
    ctl.pointer_move(Point::new(10.0, 5.0), &surface);
    ctl.pointer_up(&mut model).unwrap();

    assert_eq!(column_order(&model, 1), vec!["c", "a", "b"]);
}

#[test]
fn test_drag_section_into_other_column() {
    let mut model = board();
    let surface = surface(&model);
    let mut ctl = DragController::new();

    press_section(&mut ctl, &model, "a", 0);
    // Column 2 is rendered at x = 300 and is empty.
    ctl.pointer_move(Point::new(350.0, 100.0), &surface);
    let outcome = ctl.pointer_up(&mut model).unwrap();

    assert_eq!(
        outcome,
        DragOutcome::Committed {
            commit: DragCommit::Section { id: sid("a"), column: col(2), index: 0 }
        }
    );
    assert_eq!(column_order(&model, 1), vec!["b", "c"]);
    assert_eq!(column_order(&model, 2), vec!["a"]);
    assert!(model.check_invariants().is_ok());
}

// ─── Link drags ───

#[test]
fn test_drag_link_after_later_sibling() {
    let mut model = board();
    let surface = surface(&model);
    let mut ctl = DragController::new();

    let start = press_link(&mut ctl, &model, &surface, "l2", 1);
    // Lower half of l4 (rows 40 high, l4 spans 120..160).
    ctl.pointer_move(Point::new(start.x, 150.0), &surface);
    assert_eq!(
        ctl.view().map(|v| v.placeholder.clone()),
        Some(Placeholder::Link { section: sid("a"), before: Some(lid("l5")) })
    );
    ctl.pointer_up(&mut model).unwrap();

    assert_eq!(link_order(&model, "a"), vec!["l1", "l3", "l4", "l2", "l5"]);
}

#[test]
fn test_drag_link_into_empty_section() {
    let mut model = board();
    let surface = surface(&model);
    let mut ctl = DragController::new();

    let start = press_link(&mut ctl, &model, &surface, "l1", 0);
    let target_x = section_x(&surface, "b") + 50.0;
    ctl.pointer_move(Point::new(target_x, start.y), &surface);
    ctl.pointer_up(&mut model).unwrap();

    assert_eq!(link_order(&model, "a"), vec!["l2", "l3", "l4", "l5"]);
    assert_eq!(link_order(&model, "b"), vec!["l1"]);
}

#[test]
fn test_proxy_follows_pointer_with_grab_offset() {
    let model = board();
    let surface = surface(&model);
    let mut ctl = DragController::new();

    let x = section_x(&surface, "a");
    let bounds = row_bounds(x, 0);
    ctl.pointer_down(&model, DragItem::Link(lid("l1")), Point::new(x + 10.0, 5.0), bounds)
        .unwrap();
    let view = ctl.pointer_move(Point::new(x + 60.0, 105.0), &surface).unwrap();
    assert_eq!(view.proxy_origin, Point::new(x + 50.0, 100.0));
}

#[test]
fn test_off_surface_move_keeps_last_placeholder() {
    let model = board();
    let full = surface(&model);
    let mut ctl = DragController::new();

    let start = press_link(&mut ctl, &model, &full, "l1", 0);
    ctl.pointer_move(Point::new(start.x, 150.0), &full);
    let placeholder = ctl.view().unwrap().placeholder.clone();

    ctl.pointer_move(Point::new(start.x, 170.0), &DropSurface::default());
    assert_eq!(ctl.view().unwrap().placeholder, placeholder);
}

#[test]
fn test_first_move_without_containers_uses_origin_slot() {
    let model = board();
    let mut ctl = DragController::new();

    let bounds = row_bounds(0.0, 1);
    ctl.pointer_down(&model, DragItem::Link(lid("l2")), bounds.center(), bounds).unwrap();
    let view = ctl.pointer_move(Point::new(500.0, 500.0), &DropSurface::default()).unwrap();
    assert_eq!(view.placeholder, Placeholder::Link { section: sid("a"), before: Some(lid("l3")) });
}

#[test]
fn test_containers_with_negative_extents_are_still_ranked() {
    let model = board();
    let mut ctl = DragController::new();
    // Bounds reported right-to-left: col-1 spans x 90..100, col-2 spans x 390..400.
    let surface = DropSurface {
        sections: Vec::new(),
        columns: vec![
            DropContainer {
                id: col(1),
                bounds: Rect::new(100.0, 0.0, -10.0, 1000.0),
                flow: Flow::Vertical,
                items: Vec::new(),
            },
            DropContainer {
                id: col(2),
                bounds: Rect::new(400.0, 0.0, -10.0, 1000.0),
                flow: Flow::Vertical,
                items: Vec::new(),
            },
        ],
    };

    press_section(&mut ctl, &model, "b", 1);
    let view = ctl.pointer_move(Point::new(200.0, 50.0), &surface).unwrap();
    assert_eq!(view.placeholder, Placeholder::Section { column: col(1), before: None });

    let view = ctl.pointer_move(Point::new(395.0, 50.0), &surface).unwrap();
    assert_eq!(view.placeholder, Placeholder::Section { column: col(2), before: None });
}

#[test]
fn test_vanished_before_target_lands_at_end() {
    let mut model = board();
    let surface = surface(&model);
    let mut ctl = DragController::new();

    let start = press_link(&mut ctl, &model, &surface, "l1", 0);
    // Upper half of l3: before l3.
    ctl.pointer_move(Point::new(start.x, 85.0), &surface);
    model.delete_link(&lid("l3")).unwrap();
    ctl.pointer_up(&mut model).unwrap();

    assert_eq!(link_order(&model, "a"), vec!["l2", "l4", "l5", "l1"]);
}

// ─── Cancellation ───

#[test]
fn test_cancel_leaves_board_untouched() {
    let model = board();
    let surface = surface(&model);
    let before = serde_json::to_string(&model.serialize()).unwrap();
    let mut ctl = DragController::new();

    let start = press_section(&mut ctl, &model, "a", 0);
    ctl.pointer_move(Point::new(start.x, 900.0), &surface);
    assert!(ctl.cancel(CancelReason::Escape));

    assert!(ctl.is_idle());
    assert!(ctl.view().is_none());
    assert_eq!(serde_json::to_string(&model.serialize()).unwrap(), before);
}

#[test]
fn test_pointer_leave_cancels() {
    let model = board();
    let surface = surface(&model);
    let mut ctl = DragController::new();

    let start = press_section(&mut ctl, &model, "a", 0);
    ctl.pointer_move(Point::new(start.x, 300.0), &surface);
    assert!(ctl.pointer_leave());
    assert!(ctl.is_idle());
}

#[test]
fn test_release_after_cancel_is_idle() {
    let mut model = board();
    let surface = surface(&model);
    let mut ctl = DragController::new();

    let start = press_section(&mut ctl, &model, "a", 0);
    ctl.pointer_move(Point::new(start.x, 300.0), &surface);
    ctl.cancel(CancelReason::CaptureLost);
    assert_eq!(ctl.pointer_up(&mut model).unwrap(), DragOutcome::Idle);
    assert_eq!(column_order(&model, 1), vec!["a", "b", "c"]);
}

// ─── Concurrency and errors ───

#[test]
fn test_second_pointer_down_is_rejected() {
    let model = board();
    let surface = surface(&model);
    let mut ctl = DragController::new();

    let start = press_section(&mut ctl, &model, "a", 0);
    let err = ctl
        .pointer_down(&model, DragItem::Section(sid("b")), start, row_bounds(0.0, 1))
        .unwrap_err();
    assert_eq!(err, DragError::ConcurrentDrag);

    ctl.pointer_move(Point::new(start.x, 300.0), &surface);
    let err = ctl
        .pointer_down(&model, DragItem::Link(lid("l1")), start, row_bounds(0.0, 0))
        .unwrap_err();
    assert_eq!(err, DragError::ConcurrentDrag);
    assert_eq!(ctl.view().unwrap().suppressed, DragItem::Section(sid("a")));
}

#[test]
fn test_pointer_down_on_unknown_item_fails() {
    let model = board();
    let mut ctl = DragController::new();
    let err = ctl
        .pointer_down(&model, DragItem::Link(lid("ghost")), Point::new(0.0, 0.0), row_bounds(0.0, 0))
        .unwrap_err();
    assert!(matches!(err, DragError::Layout(LayoutError::NotFound(_))));
    assert!(ctl.is_idle());
}

// ─── Hooks ───

#[test]
fn test_hooks_fire_in_order() {
    let mut model = board();
    let surface = surface(&model);
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut ctl = DragController::new();
    ctl.add_observer(Box::new(Recorder(log.clone())));

    // Click: no hooks.
    press_section(&mut ctl, &model, "a", 0);
    ctl.pointer_up(&mut model).unwrap();
    assert!(log.borrow().is_empty());

    // Drag then cancel.
    let start = press_section(&mut ctl, &model, "a", 0);
    ctl.pointer_move(Point::new(start.x, 300.0), &surface);
    ctl.pointer_move(Point::new(start.x, 310.0), &surface);
    ctl.cancel(CancelReason::Escape);

    // Drag then commit.
    let start = press_section(&mut ctl, &model, "a", 0);
    ctl.pointer_move(Point::new(start.x, 300.0), &surface);
    ctl.pointer_up(&mut model).unwrap();

    let log = log.borrow();
    assert_eq!(log.len(), 4);
    assert!(log[0].starts_with("start"));
    assert_eq!(log[1], "cancel Escape");
    assert!(log[2].starts_with("start"));
    assert!(log[3].starts_with("commit"));
}
