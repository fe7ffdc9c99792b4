// Integration tests for the on-disk store and the EmailJS dispatch flow,
// with the HTTP side mocked out so no real mail ever leaves the box.

use taipu::email::{self, EmailError, EmailSettings, Mailer};
use taipu::session::{Session, SessionResult, SessionSettings};
use taipu::store::Store;

fn completed_session(score: i64) -> Session {
    let mut session = Session::begin(
        SessionSettings::default(),
        "https://example.com/typing",
        "Unit 3 | Typing",
    );
    session.finish(SessionResult {
        score,
        time: 30.0,
        total_keystrokes: 200,
        mistakes: 4,
    });
    session
}

fn filled_settings() -> EmailSettings {
    EmailSettings {
        email_from: "from@example.com".to_string(),
        email_to: "to@example.com".to_string(),
        emailjs_public_key: "pub_key".to_string(),
        emailjs_service_id: "svc_id".to_string(),
        emailjs_template_id: "tpl_id".to_string(),
    }
}

#[test]
fn sessions_survive_reopening_the_store() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taipu.db");

    {
        let store = Store::open(&path).unwrap();
        store.append_session(&completed_session(100)).unwrap();
        store.append_session(&completed_session(200)).unwrap();
    }

    // Act
    let store = Store::open(&path).unwrap();
    let sessions = store.sessions().unwrap();

    // Assert: insertion order is preserved across reopens
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].result.unwrap().score, 100);
    assert_eq!(sessions[1].result.unwrap().score, 200);
}

#[test]
fn kv_settings_survive_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taipu.db");

    {
        let store = Store::open(&path).unwrap();
        email::save_settings(&store, &filled_settings()).unwrap();
    }

    let store = Store::open(&path).unwrap();
    assert_eq!(email::load_settings(&store), filled_settings());
}

#[test]
fn send_and_clear_posts_and_empties_the_store() {
    // Arrange
    let store = Store::open_in_memory().unwrap();
    store.append_session(&completed_session(1234)).unwrap();

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/v1.0/email/send")
        .match_header("content-type", "application/json")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "service_id": "svc_id",
            "template_id": "tpl_id",
            "user_id": "pub_key",
        })))
        .with_status(200)
        .create();

    // Act
    let mailer = Mailer::with_base_url(&server.url());
    let count = mailer.send_and_clear(&filled_settings(), &store).unwrap();

    // Assert
    mock.assert();
    assert_eq!(count, 1);
    assert!(store.sessions().unwrap().is_empty());
}

#[test]
fn rejected_send_keeps_the_sessions() {
    // Arrange
    let store = Store::open_in_memory().unwrap();
    store.append_session(&completed_session(1234)).unwrap();

    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/api/v1.0/email/send")
        .with_status(400)
        .with_body("bad key")
        .create();

    // Act
    let mailer = Mailer::with_base_url(&server.url());
    let err = mailer.send_and_clear(&filled_settings(), &store).unwrap_err();

    // Assert: the error carries the response and nothing was cleared
    match err {
        EmailError::Rejected { status, body } => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(body, "bad key");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.sessions().unwrap().len(), 1);
}

#[test]
fn validation_fails_before_any_request() {
    // Arrange: an unroutable base url proves no request is attempted
    let store = Store::open_in_memory().unwrap();
    store.append_session(&completed_session(1)).unwrap();
    let mailer = Mailer::with_base_url("http://127.0.0.1:1");

    // Act
    let err = mailer
        .send_and_clear(&EmailSettings::default(), &store)
        .unwrap_err();

    // Assert
    assert!(matches!(err, EmailError::MissingAddresses));
    assert_eq!(store.sessions().unwrap().len(), 1);
}
