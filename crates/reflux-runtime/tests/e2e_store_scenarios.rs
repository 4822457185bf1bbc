#![forbid(unsafe_code)]

//! End-to-end scenarios for the store and change detector working together.
//!
//! Covers:
//! 1. Counter registration, replay and update.
//! 2. Nested update ordering between two listeners.
//! 3. Default change detection over `5, 5, 6`.
//! 4. A search-box style listener that re-renders only when its query
//!    changes, with rendering deferred to the microtask queue.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use reflux_runtime::{MicrotaskQueue, Push, Store, StoreConfig, on_change};

#[derive(Debug, Clone, PartialEq)]
struct Counter {
    count: i32,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct SearchState {
    query: String,
    tokens: Vec<String>,
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};
    let _ = fmt()
        .with_env_filter(EnvFilter::new("trace"))
        .with_test_writer()
        .try_init();
}

// ── 1. Counter ──────────────────────────────────────────────────────────

#[test]
fn counter_register_then_increment() {
    init_tracing();
    let store = Store::new(|| Counter { count: 0 });
    let seen = Rc::new(RefCell::new(Vec::new()));

    let seen2 = Rc::clone(&seen);
    let push = store.register(move |s: &Counter, _: &Push<Counter>| seen2.borrow_mut().push(s.clone()));
    assert_eq!(*seen.borrow(), vec![Counter { count: 0 }]);

    let result = push.update(|s| Counter { count: s.count + 1 }).unwrap();
    assert_eq!(result, Counter { count: 1 });
    assert_eq!(
        *seen.borrow(),
        vec![Counter { count: 0 }, Counter { count: 1 }]
    );
}

// ── 2. Nested update ordering ───────────────────────────────────────────

#[test]
fn nested_update_runs_after_earlier_listeners() {
    init_tracing();
    let store = Store::with_config(StoreConfig::default().with_label("ordering"), || Counter {
        count: 0,
    });
    let events: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    let ev_f = Rc::clone(&events);
    let f = store.register(move |s: &Counter, _: &Push<Counter>| {
        ev_f.borrow_mut().push(format!("f({})", s.count));
    });

    let ev_g = Rc::clone(&events);
    let nested_once = Rc::new(Cell::new(false));
    let _g = store.register(move |s: &Counter, push: &Push<Counter>| {
        ev_g.borrow_mut().push(format!("g({})", s.count));
        if s.count == 1 && !nested_once.replace(true) {
            ev_g.borrow_mut().push("g:nested".to_string());
            push.update(|s| s.clone()).unwrap();
        }
    });
    events.borrow_mut().clear();

    f.update(|s| Counter { count: s.count + 1 }).unwrap();

    assert_eq!(
        *events.borrow(),
        vec!["f(1)", "g(1)", "g:nested", "f(1)", "g(1)"]
    );
    assert_eq!(store.version(), 2);
}

// ── 3. Change detection over 5, 5, 6 ────────────────────────────────────

#[test]
fn change_detector_default_sequence() {
    let queue = MicrotaskQueue::new();
    let detector = on_change::<i32>(&queue);
    let calls: Rc<RefCell<Vec<(i32, i32)>>> = Rc::new(RefCell::new(Vec::new()));

    for value in [5, 5, 6] {
        let calls2 = Rc::clone(&calls);
        detector.observe(value, move |v, prev| calls2.borrow_mut().push((v, prev)));
        assert!(calls.borrow().is_empty(), "callback ran synchronously");
    }

    queue.run_until_idle();
    assert_eq!(*calls.borrow(), vec![(5, 5), (6, 5)]);
}

// ── 4. Search box ───────────────────────────────────────────────────────

fn tokenize(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_string).collect()
}

#[test]
fn search_box_renders_only_on_query_change() {
    init_tracing();
    let queue = MicrotaskQueue::new();
    let store = Store::with_config(StoreConfig::default().with_label("issue-search"), SearchState::default);
    let renders: Rc<RefCell<Vec<(String, String)>>> = Rc::new(RefCell::new(Vec::new()));

    // Tokenizer: keeps `tokens` in step with `query`.
    let _tokenizer = store.register(|s: &SearchState, push: &Push<SearchState>| {
        let tokens = tokenize(&s.query);
        if tokens != s.tokens {
            push.update(move |s| SearchState {
                tokens,
                ..s.clone()
            })
            .unwrap();
        }
    });

    // Renderer: reacts only to query changes, after the dispatch unwinds.
    let detector = on_change::<String>(&queue);
    let renders2 = Rc::clone(&renders);
    let input = store.register(move |s: &SearchState, _: &Push<SearchState>| {
        let renders = Rc::clone(&renders2);
        detector.observe(s.query.clone(), move |query, previous| {
            renders.borrow_mut().push((query, previous));
        });
    });
    queue.run_until_idle();
    assert_eq!(*renders.borrow(), vec![(String::new(), String::new())]);

    let typed = input
        .update(|s| SearchState {
            query: "#bug @alice".to_string(),
            ..s.clone()
        })
        .unwrap();
    assert_eq!(typed.tokens, vec!["#bug", "@alice"]);
    queue.run_until_idle();

    // Selection change: identity update, no re-render.
    input.update(|s| s.clone()).unwrap();
    queue.run_until_idle();

    assert_eq!(
        *renders.borrow(),
        vec![
            (String::new(), String::new()),
            ("#bug @alice".to_string(), String::new()),
        ]
    );
    assert_eq!(store.state().tokens, vec!["#bug", "@alice"]);
}

#[test]
fn removing_token_through_listener_handle() {
    let store = Store::new(|| SearchState {
        query: "#bug or #feature".to_string(),
        tokens: tokenize("#bug or #feature"),
    });
    let push = store.register(|_: &SearchState, _: &Push<SearchState>| {});

    let next = push
        .update(|s| {
            let mut tokens = s.tokens.clone();
            tokens.remove(0);
            SearchState {
                query: tokens.join(" "),
                tokens,
            }
        })
        .unwrap();

    assert_eq!(next.query, "or #feature");
    assert!(push.unregister());
    assert_eq!(store.subscriber_count(), 0);
}
