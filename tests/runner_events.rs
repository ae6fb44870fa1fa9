//! Background runner publishing state and timer events

mod common;

use std::sync::{Arc, Mutex};

use common::{wait_for, Harness};
use deaths_door_autosplitter::games::deaths_door::NEW_SAVE_SPAWN_ID;
use deaths_door_autosplitter::{Autosplitter, SplitCategory, TimerEvent};

#[test]
fn test_runner_emits_session_events() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut h = Harness::new(&[("Scene", "lvl_A")]);
    let runner = Autosplitter::default();

    let events = Arc::new(Mutex::new(Vec::new()));
    {
        let events = events.clone();
        runner.on_event(Box::new(move |event| events.lock().unwrap().push(event.clone())));
    }
    let split_ids = Arc::new(Mutex::new(Vec::new()));
    {
        let split_ids = split_ids.clone();
        runner.on_split(Box::new(move |split| split_ids.lock().unwrap().push(split.identifier)));
    }

    runner.start_with(h.take_splitter()).unwrap();
    wait_for(|| runner.state().ready);

    h.begin_new_save();
    wait_for(|| runner.state().session_active);

    h.close_save_menu();
    h.set_spawn(NEW_SAVE_SPAWN_ID);
    h.set_scene("lvl_A");
    wait_for(|| runner.state().split_count() == 1);
    assert_eq!(runner.state().remaining, 0);

    h.set_loading_icon(true);
    wait_for(|| runner.state().loading);

    runner.reset();
    wait_for(|| !runner.state().session_active);

    runner.stop();
    let state = runner.state();
    assert!(!state.running);
    assert!(!state.process_attached);

    let events = events.lock().unwrap();
    let started = events.iter().position(|e| *e == TimerEvent::Started).unwrap();
    let split = events
        .iter()
        .position(|e| matches!(e, TimerEvent::Split(s) if s.category == SplitCategory::Scene))
        .unwrap();
    let loading = events.iter().position(|e| *e == TimerEvent::LoadingChanged(true)).unwrap();
    let reset = events.iter().position(|e| *e == TimerEvent::Reset).unwrap();
    assert!(started < split && split < loading && loading < reset);

    assert_eq!(*split_ids.lock().unwrap(), vec!["lvl_A".to_string()]);
}

#[test]
fn test_runner_reports_missing_process() {
    let runner = Autosplitter::default();
    let mut h = Harness::new(&[]);
    h.finder.remove_process(common::PID);

    runner.start_with(h.take_splitter()).unwrap();
    wait_for(|| !runner.state().process_attached);
    assert!(runner.is_running());
    assert!(!runner.state().ready);

    runner.stop();
    assert!(!runner.is_running());
}
