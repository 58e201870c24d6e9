use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use keyweave_core::events::ecodes::{EV_KEY, EV_REL, REL_HWHEEL, REL_WHEEL, REL_Y};

use crate::test_utils::{Recorder, assert_balanced};
use crate::{Config, Macro, MappingConfig, SymbolTable, VarStore, compile_with};

fn code(name: &str) -> u16 {
    SymbolTable::builtin().get(name).unwrap()
}

/// Compile against a private store so tests cannot see each other's
/// variables.
fn compile_fresh(source: &str) -> Macro {
    compile_in(source, VarStore::in_memory())
}

fn compile_in(source: &str, store: VarStore) -> Macro {
    compile_with(
        source,
        &MappingConfig::default(),
        SymbolTable::builtin(),
        store,
    )
    .unwrap()
}

fn spawn_run(instance: &Arc<Macro>, recorder: &Recorder) -> JoinHandle<()> {
    let instance = Arc::clone(instance);
    let recorder = recorder.clone();
    tokio::spawn(async move { instance.run(&recorder).await })
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// The default keystroke sleep, which all timing expectations below build on.
const S: u64 = crate::DEFAULT_KEYSTROKE_SLEEP_MS;

#[track_caller]
fn assert_close(elapsed: Duration, expected_ms: u64) {
    let expected = ms(expected_ms);
    assert!(
        elapsed >= expected.mul_f64(0.9) && elapsed <= expected.mul_f64(1.1),
        "elapsed {elapsed:?}, expected about {expected:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn tap_emits_down_and_up() {
    let instance = compile_fresh("k(1)");
    let recorder = Recorder::default();

    let start = Instant::now();
    instance.run(&recorder).await;

    assert_eq!(
        recorder.events(),
        vec![(EV_KEY, code("1"), 1), (EV_KEY, code("1"), 0)]
    );
    // the trailing sleep after the up is part of the contract
    assert_close(start.elapsed(), 2 * S);
}

#[tokio::test(start_paused = true)]
async fn chain_runs_in_source_order() {
    let instance = compile_fresh("k(1).k(\"a\").k(3)");
    let recorder = Recorder::default();
    instance.run(&recorder).await;

    assert_eq!(
        recorder.events(),
        vec![
            (EV_KEY, code("1"), 1),
            (EV_KEY, code("1"), 0),
            (EV_KEY, code("a"), 1),
            (EV_KEY, code("a"), 0),
            (EV_KEY, code("3"), 1),
            (EV_KEY, code("3"), 0),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn repeat_multiplies_the_body() {
    let instance = compile_fresh("r(20, k(k)).r(1, k(k))");
    let recorder = Recorder::default();

    let start = Instant::now();
    instance.run(&recorder).await;

    let pair = [(EV_KEY, code("k"), 1), (EV_KEY, code("k"), 0)];
    assert_eq!(recorder.events(), pair.repeat(21));
    assert_close(start.elapsed(), 2 * 21 * S);
}

#[tokio::test(start_paused = true)]
async fn waits_add_up_with_keystroke_sleeps() {
    let instance = compile_fresh("r(3, k(m).w(100))");
    let recorder = Recorder::default();

    let start = Instant::now();
    instance.run(&recorder).await;

    let pair = [(EV_KEY, code("m"), 1), (EV_KEY, code("m"), 0)];
    assert_eq!(recorder.events(), pair.repeat(3));
    assert_close(start.elapsed(), 6 * S + 300);
}

#[tokio::test(start_paused = true)]
async fn whitespace_does_not_change_meaning() {
    let instance = compile_fresh("  r(2,\nk(\nr ).k(minus\n )).k(m)  ");
    let recorder = Recorder::default();
    instance.run(&recorder).await;

    assert_eq!(
        recorder.events(),
        vec![
            (EV_KEY, code("r"), 1),
            (EV_KEY, code("r"), 0),
            (EV_KEY, code("minus"), 1),
            (EV_KEY, code("minus"), 0),
            (EV_KEY, code("r"), 1),
            (EV_KEY, code("r"), 0),
            (EV_KEY, code("minus"), 1),
            (EV_KEY, code("minus"), 0),
            (EV_KEY, code("m"), 1),
            (EV_KEY, code("m"), 0),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn modifiers_wrap_their_bodies() {
    let instance = compile_fresh("w(200).r(2,m(w,\nr(2,\tk(BtN_LeFt))).w(10).k(k))");
    let recorder = Recorder::default();

    let start = Instant::now();
    instance.run(&recorder).await;

    let mut expected = vec![(EV_KEY, code("w"), 1)];
    expected.extend([(EV_KEY, code("btn_left"), 1), (EV_KEY, code("btn_left"), 0)].repeat(2));
    expected.push((EV_KEY, code("w"), 0));
    expected.extend([(EV_KEY, code("k"), 1), (EV_KEY, code("k"), 0)]);
    let expected = expected.repeat(2);
    assert_eq!(recorder.events(), expected);
    assert_balanced(&recorder.events());

    // 200ms up front, then per round: four tap pauses, a w(10), one tap
    assert_close(start.elapsed(), 200 + 2 * (4 * S + 10 + 2 * S));
}

#[tokio::test(start_paused = true)]
async fn hold_repeats_body_until_release() {
    let instance = Arc::new(compile_fresh("k(1).h(k(a)).k(3)"));
    let recorder = Recorder::default();

    instance.press_key();
    time::sleep(ms(50)).await;
    assert!(instance.is_holding());
    instance.press_key(); // redundant press is harmless

    let handle = spawn_run(&instance, &recorder);
    time::sleep(ms(200)).await;
    assert!(instance.is_holding());
    assert!(recorder.len() > 2);

    instance.release_key();
    handle.await.unwrap();
    assert!(!instance.is_holding());

    let events = recorder.events();
    assert_eq!(events[0], (EV_KEY, code("1"), 1));
    assert_eq!(*events.last().unwrap(), (EV_KEY, code("3"), 0));
    assert!(recorder.count((EV_KEY, code("a"), 1)) > 2);
    assert_balanced(&events);
}

#[tokio::test(start_paused = true)]
async fn hold_body_never_runs_unarmed() {
    let instance = compile_fresh("k(1).h(k(a)).k(3)");
    let recorder = Recorder::default();

    instance.run(&recorder).await;
    assert!(!instance.is_holding());

    // press_key was never called, so the body is skipped entirely
    assert_eq!(recorder.len(), 4);
    assert_eq!(recorder.events()[0], (EV_KEY, code("1"), 1));
    assert_eq!(*recorder.events().last().unwrap(), (EV_KEY, code("3"), 0));
    assert_eq!(recorder.count((EV_KEY, code("a"), 1)), 0);
}

#[tokio::test(start_paused = true)]
async fn bare_hold_blocks_until_release() {
    let instance = Arc::new(compile_fresh("k(1).h().k(3)"));
    let recorder = Recorder::default();

    instance.press_key();
    let handle = spawn_run(&instance, &recorder);
    time::sleep(ms(100)).await;
    assert!(instance.is_holding());
    assert_eq!(recorder.len(), 2);

    // blocked, not spinning: nothing new while held
    time::sleep(ms(100)).await;
    assert_eq!(recorder.len(), 2);

    instance.release_key();
    handle.await.unwrap();
    assert!(!instance.is_holding());
    assert_eq!(recorder.len(), 4);
    assert_eq!(recorder.events()[0], (EV_KEY, code("1"), 1));
    assert_eq!(*recorder.events().last().unwrap(), (EV_KEY, code("3"), 0));
}

#[tokio::test(start_paused = true)]
async fn bare_hold_is_a_no_op_unarmed() {
    let instance = compile_fresh("k(1).h().k(3)");
    let recorder = Recorder::default();
    instance.run(&recorder).await;

    assert!(!instance.is_holding());
    assert_eq!(recorder.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn hold_key_stays_down_until_release() {
    let instance = Arc::new(compile_fresh("h(a)"));
    let recorder = Recorder::default();

    instance.press_key();
    time::sleep(ms(50)).await;
    assert!(instance.is_holding());

    let handle = spawn_run(&instance, &recorder);
    instance.press_key(); // redundant press is harmless
    time::sleep(ms(200)).await;
    assert!(instance.is_holding());
    assert_eq!(recorder.events(), vec![(EV_KEY, code("a"), 1)]);

    instance.release_key();
    handle.await.unwrap();
    assert!(!instance.is_holding());
    assert_eq!(
        recorder.events(),
        vec![(EV_KEY, code("a"), 1), (EV_KEY, code("a"), 0)]
    );
}

#[tokio::test(start_paused = true)]
async fn plus_shorthand_releases_in_reverse_order() {
    let instance = Arc::new(compile_fresh("a + b + c + d"));
    let recorder = Recorder::default();

    instance.press_key();
    let handle = spawn_run(&instance, &recorder);
    time::sleep(ms(200)).await;
    assert!(instance.is_holding());

    // starting from the left, presses each key down
    assert_eq!(
        recorder.events(),
        vec![
            (EV_KEY, code("a"), 1),
            (EV_KEY, code("b"), 1),
            (EV_KEY, code("c"), 1),
            (EV_KEY, code("d"), 1),
        ]
    );

    // and releases in reverse press order
    instance.release_key();
    handle.await.unwrap();
    assert!(!instance.is_holding());
    assert_eq!(
        recorder.events()[4..],
        [
            (EV_KEY, code("d"), 0),
            (EV_KEY, code("c"), 0),
            (EV_KEY, code("b"), 0),
            (EV_KEY, code("a"), 0),
        ]
    );
    assert_balanced(&recorder.events());
}

#[tokio::test(start_paused = true)]
async fn second_run_while_live_is_ignored() {
    let instance = Arc::new(compile_fresh("k(a).m(b, h()).k(c)"));
    let recorder = Recorder::default();

    let first = spawn_run(&instance, &recorder);
    let second = spawn_run(&instance, &recorder); // loser of the guard, a no-op
    instance.press_key();
    time::sleep(ms(200)).await;
    assert!(instance.is_holding());
    assert_eq!(recorder.len(), 3); // a down, a up, b down; parked in h()

    let third = spawn_run(&instance, &recorder); // still live, also a no-op
    time::sleep(ms(50)).await;

    instance.release_key();
    for handle in [first, second, third] {
        handle.await.unwrap();
    }
    assert!(!instance.is_holding());

    let expected = vec![
        (EV_KEY, code("a"), 1),
        (EV_KEY, code("a"), 0),
        (EV_KEY, code("b"), 1),
        (EV_KEY, code("b"), 0),
        (EV_KEY, code("c"), 1),
        (EV_KEY, code("c"), 0),
    ];
    assert_eq!(recorder.events(), expected);

    // the previous run is over, so this one executes normally
    let fourth = spawn_run(&instance, &recorder);
    instance.press_key();
    time::sleep(ms(200)).await;
    assert!(instance.is_holding());
    instance.release_key();
    fourth.await.unwrap();
    assert!(!instance.is_holding());
    assert_eq!(recorder.events(), expected.repeat(2));
}

#[tokio::test(start_paused = true)]
async fn pointer_motion_ticks_while_held() {
    let mover = Arc::new(compile_fresh("mouse(up, 4)"));
    let wheeler = Arc::new(compile_fresh("wheel(left, 3)"));
    let mover_events = Recorder::default();
    let wheeler_events = Recorder::default();

    mover.press_key();
    wheeler.press_key();
    let handles = [
        spawn_run(&mover, &mover_events),
        spawn_run(&wheeler, &wheeler_events),
    ];
    time::sleep(ms(100)).await;
    assert!(mover.is_holding());
    assert!(wheeler.is_holding());

    mover.release_key();
    wheeler.release_key();
    for handle in handles {
        handle.await.unwrap();
    }

    // one tick per keystroke interval, signed magnitude on the right axis
    assert!(mover_events.count((EV_REL, REL_Y, -4)) >= 5);
    assert!(
        mover_events
            .events()
            .iter()
            .all(|event| *event == (EV_REL, REL_Y, -4))
    );
    assert!(wheeler_events.count((EV_REL, REL_HWHEEL, -3)) >= 5);
    assert!(
        wheeler_events
            .events()
            .iter()
            .all(|event| *event == (EV_REL, REL_HWHEEL, -3))
    );
}

#[tokio::test(start_paused = true)]
async fn pointer_directions_map_to_axes_and_signs() {
    for (source, expected) in [
        ("mouse(down, 2)", (EV_REL, REL_Y, 2)),
        ("wheel(up, 1)", (EV_REL, REL_WHEEL, -1)),
        ("wheel(right, 1)", (EV_REL, REL_HWHEEL, 1)),
    ] {
        let instance = Arc::new(compile_fresh(source));
        let recorder = Recorder::default();
        instance.press_key();
        let handle = spawn_run(&instance, &recorder);
        time::sleep(ms(15)).await;
        instance.release_key();
        handle.await.unwrap();
        assert_eq!(recorder.events()[0], expected, "{source}");
    }
}

#[tokio::test(start_paused = true)]
async fn pointer_motion_unarmed_emits_nothing() {
    let instance = compile_fresh("mouse(up, 4)");
    let recorder = Recorder::default();
    instance.run(&recorder).await;
    assert_eq!(recorder.len(), 0);
}

#[tokio::test(start_paused = true)]
async fn raw_events_pass_through() {
    let instance = compile_fresh("r(1, e(5421, 324, 154))");
    let recorder = Recorder::default();
    instance.run(&recorder).await;
    assert_eq!(recorder.events(), vec![(5421, 324, 154)]);

    let instance = compile_fresh("e(EV_KEY, KEY_A, 1)");
    let recorder = Recorder::default();
    instance.run(&recorder).await;
    assert_eq!(recorder.events(), vec![(EV_KEY, code("a"), 1)]);
}

#[tokio::test(start_paused = true)]
async fn conditionals_branch_on_the_store() {
    let store = VarStore::in_memory();

    let instance = compile_in("set(foo, 2).ifeq(foo, 2, k(a), k(b))", store.clone());
    let recorder = Recorder::default();
    instance.run(&recorder).await;
    assert_eq!(
        recorder.events(),
        vec![(EV_KEY, code("a"), 1), (EV_KEY, code("a"), 0)]
    );

    // an unset key never equals anything
    let instance = compile_in("ifeq(qux, 2, k(a), k(b))", store.clone());
    let recorder = Recorder::default();
    instance.run(&recorder).await;
    assert_eq!(
        recorder.events(),
        vec![(EV_KEY, code("b"), 1), (EV_KEY, code("b"), 0)]
    );

    // text values compare by their string form
    let instance = compile_in("set(foo, bar).ifeq(foo, bar, k(a), k(b))", store.clone());
    let recorder = Recorder::default();
    instance.run(&recorder).await;
    assert_eq!(
        recorder.events(),
        vec![(EV_KEY, code("a"), 1), (EV_KEY, code("a"), 0)]
    );

    // an absent branch emits nothing
    let instance = compile_in("ifeq(qux, 2, k(a))", store);
    let recorder = Recorder::default();
    instance.run(&recorder).await;
    assert_eq!(recorder.len(), 0);
}

#[tokio::test(start_paused = true)]
async fn conditionals_observe_writes_from_peer_stores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vars.json");

    // two instances with their own handles to the same backing file, the
    // same way two processes would share it
    let checker = compile_in("ifeq(foo, 3, k(a), k(b))", VarStore::file(&path));
    let recorder = Recorder::default();

    let writer = compile_in("set(foo, 2)", VarStore::file(&path));
    writer.run(&Recorder::default()).await;
    checker.run(&recorder).await;
    assert_eq!(
        recorder.events(),
        vec![(EV_KEY, code("b"), 1), (EV_KEY, code("b"), 0)]
    );

    let writer = compile_in("set(foo, 3)", VarStore::file(&path));
    writer.run(&Recorder::default()).await;
    checker.run(&recorder).await;
    assert_eq!(
        recorder.events()[2..],
        [(EV_KEY, code("a"), 1), (EV_KEY, code("a"), 0)]
    );
}

#[tokio::test(start_paused = true)]
async fn keystroke_sleep_follows_the_config() {
    // global config as the fallback
    let mut global = Config::new();
    global.set_keystroke_sleep_ms(100);
    let global = Arc::new(global);

    let config = MappingConfig::new(Arc::clone(&global));
    let instance = compile_with(
        "k(a).k(b)",
        &config,
        SymbolTable::builtin(),
        VarStore::in_memory(),
    )
    .unwrap();
    let start = Instant::now();
    instance.run(&Recorder::default()).await;
    assert_close(start.elapsed(), 400);

    // the mapping override wins over the global value
    let mut config = MappingConfig::new(global);
    config.set_keystroke_sleep_ms(50);
    let instance = compile_with(
        "k(a).k(b)",
        &config,
        SymbolTable::builtin(),
        VarStore::in_memory(),
    )
    .unwrap();
    let start = Instant::now();
    instance.run(&Recorder::default()).await;
    assert_close(start.elapsed(), 200);
}

#[tokio::test(start_paused = true)]
async fn capabilities_cover_everything_emitted() {
    for source in [
        "k(1)",
        "k(1).k(\"a\").k(3)",
        "r(2, k(k))",
        "e(5421, 324, 154)",
        "set(foo, 2).ifeq(foo, 2, k(a), k(b))",
        "a + b + c + d",
    ] {
        let instance = Arc::new(compile_fresh(source));
        let caps = instance.capabilities();
        let recorder = Recorder::default();

        instance.press_key();
        let handle = spawn_run(&instance, &recorder);
        time::sleep(ms(100)).await;
        instance.release_key();
        handle.await.unwrap();

        for (ev_type, event_code, _) in recorder.events() {
            assert!(
                caps.contains(ev_type, event_code),
                "{source}: emitted ({ev_type}, {event_code}) outside capabilities"
            );
        }
    }
}
