// Integration tests that drive the whole capture pipeline headlessly:
// page events go in through an event source, sessions come out of the
// store, and page commands are collected from the sink. No TTY needed.

use taipu::capture::page::{
    PageCommand, PageEvent, PageEventKind, PageSnapshot, CHECKBOX_SOUND, CHECKBOX_SPELL, KEY_SPACE,
    RESULT_CARD, RESULT_CLOSE, RESULT_MISS, RESULT_SCORE, RESULT_TIME, RESULT_TOTAL, START_MARKER,
    START_SCREEN, TARGET_JAPANESE, TOGGLE_JAPANESE,
};
use taipu::capture::source::{ChannelEventSource, RecordingSink};
use taipu::capture::{run, CaptureMachine};
use taipu::store::Store;
use taipu::toggles::VisibilityToggles;

fn snapshot() -> PageSnapshot {
    PageSnapshot::new("https://example.com/typing", "Unit 5 | Typing Practice")
}

fn start_marker_event() -> PageEvent {
    PageEvent::new(
        PageEventKind::StartAreaChanged,
        snapshot().with_text(START_SCREEN, &format!("{START_MARKER}キーでスタート")),
    )
}

fn space_event() -> PageEvent {
    PageEvent::new(
        PageEventKind::KeyDown {
            key: KEY_SPACE.to_string(),
        },
        snapshot()
            .with_checkbox(CHECKBOX_SOUND, true)
            .with_checkbox(CHECKBOX_SPELL, false),
    )
}

fn result_body_event() -> PageEvent {
    PageEvent::new(
        PageEventKind::BodyChanged,
        snapshot()
            .with_element(RESULT_CARD)
            .with_text(RESULT_SCORE, "1234点")
            .with_element(RESULT_CLOSE),
    )
}

fn close_event() -> PageEvent {
    PageEvent::new(
        PageEventKind::Click {
            target: RESULT_CLOSE.to_string(),
        },
        snapshot()
            .with_text(RESULT_SCORE, "1234点")
            .with_text(RESULT_TIME, "45.6秒")
            .with_text(RESULT_TOTAL, "500")
            .with_text(RESULT_MISS, "12"),
    )
}

#[test]
fn full_event_stream_records_one_session() {
    // Arrange
    let store = Store::open_in_memory().unwrap();
    let mut machine = CaptureMachine::new();
    let mut toggles = VisibilityToggles::load(&store);
    let mut sink = RecordingSink::new();
    let (tx, source) = ChannelEventSource::pair();

    for event in [
        start_marker_event(),
        space_event(),
        result_body_event(),
        close_event(),
    ] {
        tx.send(event).unwrap();
    }
    drop(tx);

    // Act
    let recorded = run(&mut machine, &mut toggles, &store, source, &mut sink);

    // Assert
    assert_eq!(recorded, 1);
    let sessions = store.sessions().unwrap();
    assert_eq!(sessions.len(), 1);

    let session = &sessions[0];
    assert!(session.is_complete());
    assert_eq!(session.url, "https://example.com/typing");
    assert_eq!(session.section.as_deref(), Some("Unit 5"));
    assert!(session.settings.sound);
    assert!(!session.settings.spell);
    assert!(session.settings.japanese);

    let result = session.result.unwrap();
    assert_eq!(result.score, 1234);
    assert_eq!(result.time, 45.6);
    assert_eq!(result.total_keystrokes, 500);
    assert_eq!(result.mistakes, 12);

    // The page heard about both phases of the session.
    assert!(sink.commands.iter().any(
        |c| matches!(c, PageCommand::SetStatus { text } if text == "Session: In progress")
    ));
    assert!(sink.commands.iter().any(
        |c| matches!(c, PageCommand::SetStatus { text } if text == "Session: Completed")
    ));
    assert!(sink
        .commands
        .iter()
        .any(|c| matches!(c, PageCommand::SetControlsEnabled { enabled: false })));
    assert!(sink
        .commands
        .iter()
        .any(|c| matches!(c, PageCommand::SetControlsEnabled { enabled: true })));
}

#[test]
fn space_after_saving_does_not_record_twice() {
    // Arrange
    let store = Store::open_in_memory().unwrap();
    let mut machine = CaptureMachine::new();
    let mut toggles = VisibilityToggles::load(&store);
    let mut sink = RecordingSink::new();
    let (tx, source) = ChannelEventSource::pair();

    let save_shortcut = PageEvent::new(
        PageEventKind::KeyDown {
            key: KEY_SPACE.to_string(),
        },
        close_event().snapshot,
    );
    for event in [
        start_marker_event(),
        space_event(),
        result_body_event(),
        save_shortcut.clone(),
        save_shortcut,
        close_event(),
    ] {
        tx.send(event).unwrap();
    }
    drop(tx);

    // Act
    let recorded = run(&mut machine, &mut toggles, &store, source, &mut sink);

    // Assert
    assert_eq!(recorded, 1);
    assert_eq!(store.sessions().unwrap().len(), 1);
}

#[test]
fn interrupted_stream_records_nothing() {
    // Arrange: the stream dies after the session starts
    let store = Store::open_in_memory().unwrap();
    let mut machine = CaptureMachine::new();
    let mut toggles = VisibilityToggles::load(&store);
    let mut sink = RecordingSink::new();
    let (tx, source) = ChannelEventSource::pair();

    tx.send(start_marker_event()).unwrap();
    tx.send(space_event()).unwrap();
    drop(tx);

    // Act
    let recorded = run(&mut machine, &mut toggles, &store, source, &mut sink);

    // Assert
    assert_eq!(recorded, 0);
    assert!(store.sessions().unwrap().is_empty());
}

#[test]
fn toggle_event_persists_and_drives_the_page() {
    // Arrange
    let store = Store::open_in_memory().unwrap();
    let mut machine = CaptureMachine::new();
    let mut toggles = VisibilityToggles::load(&store);
    let mut sink = RecordingSink::new();
    let (tx, source) = ChannelEventSource::pair();

    tx.send(PageEvent::new(
        PageEventKind::ToggleChanged {
            toggle: TOGGLE_JAPANESE.to_string(),
            enabled: false,
        },
        snapshot().with_element(TARGET_JAPANESE),
    ))
    .unwrap();
    drop(tx);

    // Act
    run(&mut machine, &mut toggles, &store, source, &mut sink);

    // Assert
    assert!(!toggles.settings().show_japanese);
    assert!(!VisibilityToggles::load(&store).settings().show_japanese);
    assert!(sink.commands.iter().any(|c| matches!(
        c,
        PageCommand::SetVisible { target, visible: false } if target == TARGET_JAPANESE
    )));
}

#[test]
fn capture_subcommand_reads_a_file_and_reports_back() {
    // Arrange: a full session scripted as the shim's NDJSON stream
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("taipu.db");
    let events = dir.path().join("events.jsonl");

    let lines = [
        r#"{"type":"start_area_changed","snapshot":{"url":"https://example.com/typing","title":"Unit 5 | Typing Practice","elements":{"p-typingscreen__start":{"text":"スペースキーでスタート"}}}}"#,
        r#"{"type":"key_down","key":"Space","snapshot":{"url":"https://example.com/typing","title":"Unit 5 | Typing Practice","elements":{"p-typingscreen__startscreen__sound":{"checked":true},"p-typingscreen__startscreen__roman":{"checked":false}}}}"#,
        r#"{"type":"body_changed","snapshot":{"url":"https://example.com/typing","title":"Unit 5 | Typing Practice","elements":{"p-typingresult__card":{},"p-typingresult--score":{"text":"1234点"},"typing_store_close":{}}}}"#,
        r#"{"type":"click","target":"typing_store_close","snapshot":{"url":"https://example.com/typing","title":"Unit 5 | Typing Practice","elements":{"p-typingresult--score":{"text":"1234点"},"p-typingresult--time":{"text":"45.6秒"},"p-typingresult--all":{"text":"500"},"p-typingresult--miss":{"text":"12"}}}}"#,
    ];
    std::fs::write(&events, lines.join("\n")).unwrap();

    // Act
    let output = assert_cmd::Command::cargo_bin("taipu")
        .unwrap()
        .arg("--db")
        .arg(&db)
        .arg("capture")
        .arg(&events)
        .assert()
        .success();

    // Assert: commands came back on stdout, the session landed in the db
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains(r#""type":"set_status""#));
    assert!(stdout.contains("Session: Completed"));

    let store = Store::open(&db).unwrap();
    let sessions = store.sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].result.unwrap().score, 1234);
}
