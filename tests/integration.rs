//! Integration tests for tiny-ui.
//!
//! These tests exercise the public API from outside the crate: signals and
//! sequences driving computations, the renderer reconciling onto an in-memory
//! target, and the app frame loop. Each test runs on its own thread and so
//! gets a fresh thread-local runtime.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tiny_ui::body::{build, build_here, BodyNode, Event, Modifier};
use tiny_ui::reactive::{
    current_computation, pending_count, scheduler_state, set_frame_clock, tracked_call,
    ManualClock, SchedulerState, Sequence, Signal, SignalRecord,
};
use tiny_ui::render::{FlushReport, RenderError, Renderer, Target};
use tiny_ui::testing::{tree_to_string, MemNodeId, MemoryTarget};
use tiny_ui::units::px;
use tiny_ui::value::Value;
use tiny_ui::widgets::{button, hbox, text, text_field, vbox};
use tiny_ui::{App, AppConfig, AppError};

fn renderer() -> (Renderer<MemoryTarget>, MemNodeId) {
    let mut target = MemoryTarget::new();
    let host = target.add_host("app", "div");
    (Renderer::new(target), host)
}

fn counter() -> Rc<Cell<usize>> {
    Rc::new(Cell::new(0))
}

// ---------------------------------------------------------------------------
// Cell subscription and equality gating
// ---------------------------------------------------------------------------

#[test]
fn computation_that_stops_reading_is_not_requeued() {
    let (mut r, host) = renderer();
    let cell = Signal::new(1);
    let first_run = Rc::new(Cell::new(true));
    {
        let (cell, first_run) = (cell.clone(), first_run.clone());
        r.render(&host, move || {
            let (cell, first_run) = (cell.clone(), first_run.clone());
            build_here(move || {
                if first_run.replace(false) {
                    cell.get().to_string()
                } else {
                    "done".to_owned()
                }
            });
        })
        .unwrap();
    }

    cell.set(2);
    assert_eq!(pending_count(), 1);
    assert_eq!(r.flush().unwrap(), FlushReport { rebuilt: 1, skipped: 0 });

    cell.set(3);
    assert_eq!(pending_count(), 0);
    assert_eq!(cell.subscriber_count(), 0);
    assert_eq!(scheduler_state(), SchedulerState::Idle);
}

#[test]
fn equal_write_keeps_subscribers_and_schedules_nothing() {
    let clock = Rc::new(ManualClock::new());
    set_frame_clock(clock.clone());
    let (mut r, host) = renderer();
    let cell = Signal::new(Value::from("same"));
    {
        let cell = cell.clone();
        r.render(&host, move || {
            let cell = cell.clone();
            build_here(move || cell.get().to_string());
        })
        .unwrap();
    }

    cell.set(Value::from("same"));
    assert_eq!(pending_count(), 0);
    assert_eq!(clock.requested(), 0);
    assert_eq!(cell.subscriber_count(), 1);

    cell.set(Value::from("other"));
    assert_eq!(pending_count(), 1);
    assert_eq!(clock.requested(), 1);
}

#[test]
fn numeric_string_is_coerced_and_notifies_once() {
    let clock = Rc::new(ManualClock::new());
    set_frame_clock(clock.clone());
    let cell = Signal::new(Value::from(4));
    let reader = build(
        {
            let cell = cell.clone();
            move || cell.get().to_string()
        },
        None,
    );
    assert!(reader.computation().is_some());

    cell.set(Value::from("5"));
    assert_eq!(cell.get_untracked(), Value::Number(5.0));
    assert_eq!(pending_count(), 1);
    assert_eq!(clock.requested(), 1);
}

#[test]
fn tracking_is_restored_after_a_panicking_computation() {
    let node = build(|| (), None);
    let outer = node.computation().unwrap();
    let inner = build(|| (), None).computation().unwrap();
    tracked_call(outer, || {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            tracked_call(inner, || panic!("computation failed"));
        }));
        assert!(result.is_err());
        assert_eq!(current_computation(), Some(outer));
    });
    assert_eq!(current_computation(), None);
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

#[test]
fn sequence_cells_are_lazy_and_stable() {
    let seq: Sequence<i64> = (0..100).collect::<Vec<_>>().into();
    assert!(!seq.has_cell(50));
    let a = seq.cell(50).unwrap();
    assert_eq!(seq.cell_count(), 1);
    let b = seq.cell(50).unwrap();
    assert!(a.ptr_eq(&b));
    assert_eq!(b.get(), 50);
}

#[test]
fn sequence_shrink_then_grow_yields_fresh_cells() {
    let seq: Sequence<Value> = vec![1, 2, 3, 4, 5i32]
        .into_iter()
        .map(Value::from)
        .collect::<Vec<_>>()
        .into();
    let before: Vec<_> = (0..5).map(|i| seq.cell(i).unwrap()).collect();

    seq.set_len(2);
    seq.set_len(5);

    assert!(seq.cell(0).unwrap().ptr_eq(&before[0]));
    assert!(seq.cell(1).unwrap().ptr_eq(&before[1]));
    for (i, stale) in before.iter().enumerate().skip(2) {
        let fresh = seq.cell(i).unwrap();
        assert!(!fresh.ptr_eq(stale));
        assert_eq!(fresh.get(), Value::Undefined);
    }
}

#[test]
fn list_rendering_follows_sequence_length() {
    let (mut r, host) = renderer();
    let items: Sequence<String> = vec!["a".to_owned(), "b".to_owned()].into();
    {
        let items = items.clone();
        r.render(&host, move || {
            let items = items.clone();
            vbox(move || {
                for item in items.to_vec() {
                    text(item);
                }
            });
        })
        .unwrap();
    }
    items.push("c".to_owned());
    r.flush().unwrap();

    insta::assert_snapshot!(tree_to_string(r.target(), &host), @r#"
<div id="app">
  <div style="display: flex; flex-direction: column">
    <span>a</span>
    <span>b</span>
    <span>c</span>
  </div>
</div>
"#);
}

#[test]
fn record_state_drives_a_dice_row() {
    let (mut r, host) = renderer();
    let state = SignalRecord::new().with("values", vec![1, 2]);
    {
        let this = state.clone();
        state.insert_computed("total", move || {
            let total: f64 = this
                .list("values")
                .map(|values| values.to_vec().iter().map(Value::to_number).sum())
                .unwrap_or_default();
            Value::from(total)
        });
    }
    {
        let state = state.clone();
        r.render(&host, move || {
            let values = state.list("values").unwrap_or_else(|_| Sequence::new(Vec::new()));
            hbox(move || {
                for value in values.to_vec() {
                    text(value.to_string());
                }
            });
            let state = state.clone();
            text(move || state.get("total").unwrap_or_default().to_string());
        })
        .unwrap();
    }

    let values = state.list("values").unwrap();
    values.set_len(3);
    values.set(2, Value::from(6)).unwrap();
    r.flush().unwrap();

    insta::assert_snapshot!(tree_to_string(r.target(), &host), @r#"
<div id="app">
  <div style="display: flex; flex-direction: row">
    <span>1</span>
    <span>2</span>
    <span>6</span>
  </div>
  <span>9</span>
</div>
"#);
}

// ---------------------------------------------------------------------------
// Modifiers and reconciliation
// ---------------------------------------------------------------------------

#[test]
fn modifiers_layer_over_own_style() {
    let (mut r, host) = renderer();
    let node = build(BodyNode::new().with_style([("color", "red")]), None)
        .set_style([("color", "blue")])
        .set_style([("border", px(1))]);
    r.render(&host, node).unwrap();

    let style = r.target().style(&host);
    assert_eq!(style["color"], Value::from("blue"));
    assert_eq!(style["border"], Value::from("1px"));
}

#[test]
fn children_are_replaced_not_reused() {
    let (mut r, host) = renderer();
    let count = Signal::new(3usize);
    let list = {
        let count = count.clone();
        r.render(&host, move || {
            let count = count.clone();
            build_here(move || {
                for i in 0..count.get() {
                    build_here(i.to_string());
                }
            });
        })
        .unwrap()
    };
    let list_el = r.bound_target(list.children()[0]).cloned().unwrap();
    let old_children = r.target().children(&list_el);
    assert_eq!(old_children.len(), 3);

    count.set(2);
    r.flush().unwrap();

    let new_children = r.target().children(&list_el);
    assert_eq!(new_children.len(), 2);
    assert!(new_children.iter().all(|c| !old_children.contains(c)));
    assert_eq!(r.target().child_count(&host), 1);
}

#[test]
fn style_clearing_depends_on_declared_attributes() {
    let (mut r, host) = renderer();
    r.target_mut()
        .set_attribute(&host, "style", &Value::from("margin: 0; padding: 4px"));

    // Attributes declared with "style": the declared inline style is kept
    // and the style record is layered on top.
    r.render(
        &host,
        BodyNode::new()
            .with_attributes([("id", "app"), ("style", "margin: 0")])
            .with_style([("color", "red")]),
    )
    .unwrap();
    let style = r.target().style(&host);
    assert_eq!(style.len(), 2);
    assert_eq!(style["margin"], Value::from("0"));

    // No attributes: the inline style is cleared first.
    r.render(&host, BodyNode::new().with_style([("color", "blue")]))
        .unwrap();
    let style = r.target().style(&host);
    assert_eq!(style.len(), 1);
    assert_eq!(style["color"], Value::from("blue"));
}

#[test]
fn kind_mismatch_during_flush_is_reported() {
    let (mut r, host) = renderer();
    let wide = Signal::new(false);
    {
        let wide = wide.clone();
        r.render(&host, move || {
            let wide = wide.clone();
            build_here(move || {
                if wide.get() {
                    hbox(())
                } else {
                    text("narrow")
                }
            });
        })
        .unwrap();
    }
    wide.set(true);
    let err = r.flush().unwrap_err();
    assert_eq!(
        err,
        RenderError::KindMismatch {
            expected: "div".into(),
            found: "span".into()
        }
    );
}

// ---------------------------------------------------------------------------
// Batching
// ---------------------------------------------------------------------------

#[test]
fn three_writes_in_one_turn_rebuild_once() {
    let clock = Rc::new(ManualClock::new());
    set_frame_clock(clock.clone());
    let (mut r, host) = renderer();
    let (a, b, c) = (Signal::new(1), Signal::new(2), Signal::new(3));
    let runs = counter();
    {
        let (a, b, c, runs) = (a.clone(), b.clone(), c.clone(), runs.clone());
        r.render(&host, move || {
            let (a, b, c, runs) = (a.clone(), b.clone(), c.clone(), runs.clone());
            build_here(move || {
                runs.set(runs.get() + 1);
                (a.get() + b.get() + c.get()).to_string()
            });
        })
        .unwrap();
    }

    a.set(10);
    b.set(20);
    c.set(30);
    assert_eq!(pending_count(), 1);
    // Only the last request is still live.
    assert_eq!(clock.requested() - clock.cancelled(), 1);

    let report = r.run_frame().unwrap().unwrap();
    assert_eq!(report.rebuilt, 1);
    assert_eq!(runs.get(), 2);
    assert_eq!(
        tree_to_string(r.target(), &host),
        "<div id=\"app\">\n  <div>60</div>\n</div>"
    );
}

// ---------------------------------------------------------------------------
// Builders and events
// ---------------------------------------------------------------------------

#[test]
fn button_click_updates_counter_view() {
    let (mut r, host) = renderer();
    let clicks = Signal::new(0);
    {
        let clicks = clicks.clone();
        r.render(&host, move || {
            let on_click = {
                let clicks = clicks.clone();
                move |_: &Event| clicks.update(|n| *n += 1)
            };
            button("+", on_click, ());
            let clicks = clicks.clone();
            text(move || format!("clicked {}", clicks.get()));
        })
        .unwrap();
    }
    let button_el = r.target().children(&host)[0];
    assert!(r.target().dispatch(&button_el, &Event::new("click")));
    assert!(r.target().dispatch(&button_el, &Event::new("click")));
    r.flush().unwrap();

    insta::assert_snapshot!(tree_to_string(r.target(), &host), @r#"
<div id="app">
  <button>+</button>
  <span>clicked 2</span>
</div>
"#);
}

#[test]
fn text_field_round_trips_through_target() {
    let (mut r, host) = renderer();
    let age = Signal::new(Value::from(30));
    {
        let age = age.clone();
        r.render(&host, move || {
            text_field(&age, "age");
        })
        .unwrap();
    }
    let input = r.target().children(&host)[0];
    assert_eq!(r.target().property(&input, "value"), Some(Value::from("30")));
    assert_eq!(r.target().attribute(&input, "placeholder").as_deref(), Some("age"));

    assert!(r.target_mut().change(&input, "31"));
    assert_eq!(age.get_untracked(), Value::from(31));
    let report = r.flush().unwrap();
    assert_eq!(report.rebuilt, 1);
    // The same target node is reused for the rebuilt field.
    assert_eq!(r.target().children(&host), vec![input]);
    assert_eq!(r.target().property(&input, "value"), Some(Value::from("31")));
}

#[test]
fn call_site_modifiers_survive_rebuilds() {
    let (mut r, host) = renderer();
    let label = Signal::new(String::from("a"));
    {
        let label = label.clone();
        r.render(&host, move || {
            let label = label.clone();
            build_here(move || label.get()).modify(Modifier::style([("color", "red")]));
        })
        .unwrap();
    }
    label.set("b".to_owned());
    r.flush().unwrap();
    assert_eq!(
        tree_to_string(r.target(), &host),
        "<div id=\"app\">\n  <div style=\"color: red\">b</div>\n</div>"
    );
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

#[test]
fn app_requires_its_host() {
    let target = MemoryTarget::new();
    let err = App::mount(target, AppConfig::default(), "x").err().unwrap();
    assert!(matches!(err, AppError::MissingHost(ref id) if id == "app"));
    assert_eq!(err.to_string(), "host node #app not found");
}

#[tokio::test(start_paused = true)]
async fn app_loop_renders_frames_until_shutdown() {
    let mut target = MemoryTarget::new();
    target.add_host("root", "main");
    let count = Signal::new(0);
    let mut app = {
        let count = count.clone();
        App::mount(target, AppConfig::new().with_host_id("root"), move || {
            let count = count.clone();
            hbox(move || {
                text(count.get().to_string());
            });
        })
        .unwrap()
    };

    count.set(1);
    count.set(2);
    app.run_until(tokio::time::sleep(Duration::from_millis(50)))
        .await
        .unwrap();

    assert_eq!(scheduler_state(), SchedulerState::Idle);
    insta::assert_snapshot!(tree_to_string(app.target(), app.host()), @r#"
<main id="root">
  <div style="display: flex; flex-direction: row">
    <span>2</span>
  </div>
</main>
"#);
}
