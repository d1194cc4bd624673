use quizroom::catalog::{Candidate, StaticCatalog};
use quizroom::clock::{Clock, ManualClock};
use quizroom::config::GameConfig;
use quizroom::protocol::{ClientMessage, ScoreUpdate, ServerMessage};
use quizroom::state::AppState;
use quizroom::types::{ConnectionHandle, RoomStatus};
use quizroom::ws::handlers::handle_message;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

const T0: i64 = 1_700_000_000_000;

fn catalog() -> StaticCatalog {
    let songs = |genre: &str, n: usize| {
        (0..n)
            .map(|i| Candidate {
                title: format!("{} song {}", genre, i),
                artist: format!("{} band {}", genre, i),
                media_ref: format!("https://youtu.be/{}vid{:04}", &genre[..4], i),
            })
            .collect::<Vec<_>>()
    };
    StaticCatalog::new()
        .with_genre("rock", songs("rock", 12))
        .with_genre("jazz", songs("jazz", 3))
}

fn setup() -> (Arc<AppState>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(T0));
    let state = AppState::new(GameConfig::default(), Arc::new(catalog())).with_clock(clock.clone());
    (Arc::new(state), clock)
}

fn drain(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

struct Client {
    conn: ConnectionHandle,
    rx: UnboundedReceiver<ServerMessage>,
}

impl Client {
    fn new() -> Self {
        let (conn, rx) = ConnectionHandle::new();
        Self { conn, rx }
    }

    async fn send(&self, state: &Arc<AppState>, msg: ClientMessage) -> Option<ServerMessage> {
        handle_message(msg, &self.conn, state).await
    }

    /// Parse a raw frame the way the socket loop does, then dispatch it
    async fn send_raw(&self, state: &Arc<AppState>, frame: &str) -> Option<ServerMessage> {
        let msg: ClientMessage = serde_json::from_str(frame).ok()?;
        msg.validate(state.config.room_code_length).ok()?;
        self.send(state, msg).await
    }
}

fn join(room_code: &str, user_id: &str, name: &str, is_host: bool) -> ClientMessage {
    ClientMessage::Join {
        room_code: room_code.to_string(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        avatar_url: None,
        is_host,
    }
}

/// Host plus two players in the lobby of a fresh room
async fn lobby(state: &Arc<AppState>) -> (String, Client, Client, Client) {
    let mut host = Client::new();
    assert!(host.send(state, join("", "host", "Quizmaster", true)).await.is_none());
    let code = match drain(&mut host.rx).as_slice() {
        [ServerMessage::RoomUpdate { code, .. }] => code.clone(),
        other => panic!("Expected RoomUpdate, got {:?}", other),
    };

    let mut alice = Client::new();
    let mut bob = Client::new();
    assert!(alice.send(state, join(&code, "alice", "Alice", false)).await.is_none());
    assert!(bob.send(state, join(&code, "bob", "Bob", false)).await.is_none());
    drain(&mut host.rx);
    drain(&mut alice.rx);
    drain(&mut bob.rx);
    (code, host, alice, bob)
}

fn question_of(msgs: &[ServerMessage]) -> (String, i64) {
    match msgs {
        [ServerMessage::QuestionShow { id, deadline_ts, .. }] => (id.clone(), *deadline_ts),
        other => panic!("Expected QuestionShow, got {:?}", other),
    }
}

async fn correct_index(state: &Arc<AppState>, code: &str) -> usize {
    let room = state.get_room(code).await.expect("room exists");
    let room = room.lock().await;
    room.question().expect("question open").correct_index
}

/// End-to-end integration test for a complete game
#[tokio::test]
async fn test_full_game_flow() {
    let (state, clock) = setup();
    let (code, mut host, mut alice, mut bob) = lobby(&state).await;

    // 1. Start
    host.send(&state, ClientMessage::StartGame { room_code: code.clone() }).await;
    assert_eq!(drain(&mut alice.rx), vec![ServerMessage::GameStart { round: 1 }]);
    drain(&mut host.rx);
    drain(&mut bob.rx);

    // 2. Play all rounds: alice always right, bob right on even rounds only
    let mut game_ends = 0;
    for round in 1..=10u32 {
        host.send(
            &state,
            ClientMessage::SelectGenre {
                room_code: code.clone(),
                genre_id: "rock".to_string(),
            },
        )
        .await;

        let shown = drain(&mut bob.rx);
        match shown.as_slice() {
            [ServerMessage::QuestionShow {
                options,
                round: r,
                total_rounds,
                ..
            }] => {
                assert_eq!(options.len(), 4);
                assert_eq!(*r, round);
                assert_eq!(*total_rounds, 10);
            }
            other => panic!("Expected QuestionShow, got {:?}", other),
        }
        let (question_id, deadline) = question_of(&shown);
        assert_eq!(deadline, clock.now_ms() + 15_000);
        drain(&mut host.rx);
        drain(&mut alice.rx);

        let correct = correct_index(&state, &code).await;
        let option = u8::try_from(correct).unwrap();

        clock.advance(1_000);
        alice
            .send(
                &state,
                ClientMessage::SubmitAnswer {
                    room_code: code.clone(),
                    question_id: question_id.clone(),
                    option_index: option,
                    time_ms: 1_000,
                },
            )
            .await;

        let bob_option = if round % 2 == 0 { option } else { (option + 1) % 4 };
        clock.advance(4_000);
        bob.send(
            &state,
            ClientMessage::SubmitAnswer {
                room_code: code.clone(),
                question_id: question_id.clone(),
                option_index: bob_option,
                time_ms: 5_000,
            },
        )
        .await;

        // everyone sees who picked what, never what is right
        let updates = drain(&mut host.rx);
        assert_eq!(updates.len(), 2);
        assert!(updates
            .iter()
            .all(|m| matches!(m, ServerMessage::AnswerUpdate { .. })));
        drain(&mut alice.rx);
        drain(&mut bob.rx);

        host.send(&state, ClientMessage::Reveal {}).await;

        let msgs = drain(&mut alice.rx);
        match &msgs[0] {
            ServerMessage::AnswerReveal {
                correct_index,
                updates,
                ranking,
            } => {
                assert_eq!(*correct_index, correct);
                assert_eq!(updates[0].user_id, "alice");
                assert_eq!(updates[0].delta, 400);
                assert_eq!(updates.len(), if round % 2 == 0 { 2 } else { 1 });
                assert_eq!(ranking[0].user_id, "alice");
            }
            other => panic!("Expected AnswerReveal, got {:?}", other),
        }
        game_ends += msgs
            .iter()
            .filter(|m| matches!(m, ServerMessage::GameEnd { .. }))
            .count();
        drain(&mut host.rx);
        drain(&mut bob.rx);
    }
    assert_eq!(game_ends, 1);

    // 3. Final standings
    let room = state.get_room(&code).await.unwrap();
    let room = room.lock().await;
    assert_eq!(room.status, RoomStatus::Ended);
    assert_eq!(room.participant("alice").unwrap().score, 4_000);
    // bob: remaining = 15000 - (5000 - 5000) = 15000 on each of 5 correct rounds
    assert_eq!(room.participant("bob").unwrap().score, 2_000);
    assert_eq!(room.participant("host").unwrap().score, 0);
}

#[tokio::test]
async fn test_speed_bonus_scenario() {
    let (state, clock) = setup();
    let (code, host, alice, mut bob) = lobby(&state).await;
    host.send(&state, ClientMessage::StartGame { room_code: code.clone() }).await;
    host.send(
        &state,
        ClientMessage::SelectGenre {
            room_code: code.clone(),
            genre_id: "rock".to_string(),
        },
    )
    .await;
    drain(&mut bob.rx);
    let room = state.get_room(&code).await.unwrap();
    let question_id = room.lock().await.question().unwrap().id.clone();
    let correct = u8::try_from(correct_index(&state, &code).await).unwrap();

    // accepted 5s in after 5s of listening: the full window still counts
    clock.advance(5_000);
    alice
        .send(
            &state,
            ClientMessage::SubmitAnswer {
                room_code: code.clone(),
                question_id,
                option_index: correct,
                time_ms: 5_000,
            },
        )
        .await;
    drain(&mut bob.rx);

    host.send(&state, ClientMessage::Reveal {}).await;

    match drain(&mut bob.rx).as_slice() {
        [ServerMessage::AnswerReveal { updates, .. }] => assert_eq!(
            updates,
            &vec![ScoreUpdate {
                user_id: "alice".to_string(),
                delta: 400,
                total: 400
            }]
        ),
        other => panic!("Expected AnswerReveal, got {:?}", other),
    }
}

#[tokio::test]
async fn test_insufficient_content_only_reaches_requester() {
    let (state, _clock) = setup();
    let (code, host, mut alice, _bob) = lobby(&state).await;
    host.send(&state, ClientMessage::StartGame { room_code: code.clone() }).await;
    drain(&mut alice.rx);

    let reply = host
        .send(
            &state,
            ClientMessage::SelectGenre {
                room_code: code.clone(),
                genre_id: "jazz".to_string(),
            },
        )
        .await;

    assert_eq!(
        reply,
        Some(ServerMessage::Error {
            message: "Not enough songs for this genre".to_string()
        })
    );
    assert!(drain(&mut alice.rx).is_empty());
    let room = state.get_room(&code).await.unwrap();
    assert!(room.lock().await.question().is_none());

    // a usable genre still works afterwards
    assert!(host
        .send(
            &state,
            ClientMessage::SelectGenre {
                room_code: code,
                genre_id: "rock".to_string(),
            },
        )
        .await
        .is_none());
    assert_eq!(drain(&mut alice.rx).len(), 1);
}

#[tokio::test]
async fn test_late_and_stale_answers_are_ignored() {
    let (state, clock) = setup();
    let (code, host, mut alice, bob) = lobby(&state).await;
    host.send(&state, ClientMessage::StartGame { room_code: code.clone() }).await;

    let select = ClientMessage::SelectGenre {
        room_code: code.clone(),
        genre_id: "rock".to_string(),
    };
    host.send(&state, select.clone()).await;
    drain(&mut alice.rx);
    let first_id = {
        let room = state.get_room(&code).await.unwrap();
        let id = room.lock().await.question().unwrap().id.clone();
        id
    };
    host.send(&state, ClientMessage::Reveal {}).await;
    host.send(&state, select).await;
    drain(&mut alice.rx);

    // answer aimed at the previous question
    let stale = bob
        .send(
            &state,
            ClientMessage::SubmitAnswer {
                room_code: code.clone(),
                question_id: first_id,
                option_index: 0,
                time_ms: 100,
            },
        )
        .await;
    assert!(stale.is_none());

    // answer after the deadline
    let current_id = {
        let room = state.get_room(&code).await.unwrap();
        let id = room.lock().await.question().unwrap().id.clone();
        id
    };
    clock.advance(15_001);
    let late = bob
        .send(
            &state,
            ClientMessage::SubmitAnswer {
                room_code: code.clone(),
                question_id: current_id,
                option_index: 0,
                time_ms: 100,
            },
        )
        .await;
    assert!(late.is_none());

    assert!(drain(&mut alice.rx).is_empty());
    let room = state.get_room(&code).await.unwrap();
    assert_eq!(room.lock().await.answer_count(), 0);
}

#[tokio::test]
async fn test_malformed_and_invalid_frames_are_dropped() {
    let (state, _clock) = setup();
    let (code, _host, mut alice, bob) = lobby(&state).await;

    assert!(bob.send_raw(&state, "{").await.is_none());
    assert!(bob.send_raw(&state, r#"{"event":"game:start"}"#).await.is_none());
    assert!(bob
        .send_raw(&state, r#"{"event":"game:start","roomCode":"TOO-LONG-CODE"}"#)
        .await
        .is_none());
    let bad_avatar = format!(
        r#"{{"event":"room:join","roomCode":"{}","userId":"eve","name":"Eve","avatarUrl":"javascript:alert(1)"}}"#,
        code
    );
    assert!(bob.send_raw(&state, &bad_avatar).await.is_none());

    assert!(drain(&mut alice.rx).is_empty());
    let room = state.get_room(&code).await.unwrap();
    let room = room.lock().await;
    assert_eq!(room.status, RoomStatus::Lobby);
    assert!(room.participant("eve").is_none());
}

#[tokio::test]
async fn test_wire_join_frame() {
    let (state, _clock) = setup();
    let (code, _host, mut alice, _bob) = lobby(&state).await;
    let carol = Client::new();

    let frame = format!(
        r#"{{"event":"room:join","roomCode":"{}","userId":"carol","name":"Carol","avatarUrl":"https://example.com/c.png"}}"#,
        code
    );
    assert!(carol.send_raw(&state, &frame).await.is_none());

    match drain(&mut alice.rx).as_slice() {
        [ServerMessage::RoomUpdate { participants, .. }] => {
            let carol = participants.iter().find(|p| p.user_id == "carol").unwrap();
            assert_eq!(carol.avatar_url.as_deref(), Some("https://example.com/c.png"));
            assert_eq!(carol.score, 0);
        }
        other => panic!("Expected RoomUpdate, got {:?}", other),
    }
}

#[tokio::test]
async fn test_ranking_ties_keep_order() {
    let (state, _clock) = setup();
    let (code, host, _alice, mut bob) = lobby(&state).await;
    host.send(&state, ClientMessage::StartGame { room_code: code.clone() }).await;
    host.send(
        &state,
        ClientMessage::SelectGenre {
            room_code: code.clone(),
            genre_id: "rock".to_string(),
        },
    )
    .await;
    drain(&mut bob.rx);

    // nobody answers
    host.send(&state, ClientMessage::Reveal {}).await;

    match drain(&mut bob.rx).as_slice() {
        [ServerMessage::AnswerReveal {
            updates, ranking, ..
        }] => {
            assert!(updates.is_empty());
            let ids: Vec<_> = ranking.iter().map(|p| p.user_id.as_str()).collect();
            assert_eq!(ids, ["host", "alice", "bob"]);
        }
        other => panic!("Expected AnswerReveal, got {:?}", other),
    }
}

#[tokio::test]
async fn test_disconnect_mid_game_keeps_room_for_others() {
    let (state, _clock) = setup();
    let (code, host, mut alice, bob) = lobby(&state).await;
    host.send(&state, ClientMessage::StartGame { room_code: code.clone() }).await;
    drain(&mut alice.rx);

    state.disconnect(&bob.conn.id).await;

    match drain(&mut alice.rx).as_slice() {
        [ServerMessage::RoomUpdate {
            participants,
            status,
            ..
        }] => {
            assert_eq!(participants.len(), 2);
            assert_eq!(*status, RoomStatus::Playing);
        }
        other => panic!("Expected RoomUpdate, got {:?}", other),
    }

    // bob comes back on a new connection
    let mut bob2 = Client::new();
    assert!(bob2.send(&state, join(&code, "bob", "Bob", false)).await.is_none());
    match drain(&mut bob2.rx).as_slice() {
        [ServerMessage::RoomUpdate { status, .. }] => assert_eq!(*status, RoomStatus::Playing),
        other => panic!("Expected RoomUpdate, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_api_served() {
    let (state, _clock) = setup();
    let (code, _host, _alice, _bob) = lobby(&state).await;

    let app = quizroom::api::routes().with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let health: serde_json::Value = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, serde_json::json!({"ok": true}));

    let summary: serde_json::Value = client
        .get(format!("http://{}/api/rooms/{}", addr, code))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["participants"], 3);
    assert_eq!(summary["status"], "lobby");

    let missing = client
        .get(format!("http://{}/api/rooms/ZZZZZZ", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
}
