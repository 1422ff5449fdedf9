mod common;

use axum::http::StatusCode;
use axum::Router;

use teamflow_backend::domain::BoardView;
use teamflow_backend::reorder::{BoardStore, Commit, DropOutcome, ReorderEngine};

use common::{
    cards_of, create_board, create_card, create_organization, get_board, json_request, list_id,
    register_user, setup_test_app,
};

async fn load_engine(app: &Router, token: &str, board_id: &str) -> ReorderEngine {
    let view: BoardView = serde_json::from_value(get_board(app, token, board_id).await).unwrap();
    ReorderEngine::new(BoardStore::new(view))
}

fn dropped(outcome: DropOutcome) -> Commit {
    match outcome {
        DropOutcome::Dropped(commit) => commit,
        other => panic!("expected a commit, got {:?}", other),
    }
}

async fn send(app: &Router, token: &str, commit: &Commit) -> StatusCode {
    let (status, _) = json_request(
        app,
        "PATCH",
        &commit.payload.endpoint(),
        Some(commit.payload.body()),
        token,
    )
    .await;
    status
}

#[tokio::test]
async fn test_dragging_card_below_sibling_round_trips() {
    let t = setup_test_app().await;
    let token = register_user(&t.app, "owner@example.com", "Owner").await;
    let slug = create_organization(&t.app, &token, "Acme").await;
    let board_id = create_board(&t.app, &token, &slug, "Roadmap").await;
    let view = get_board(&t.app, &token, &board_id).await;
    let todo = list_id(&view, "To Do");
    let a = create_card(&t.app, &token, &todo, "A").await;
    let b = create_card(&t.app, &token, &todo, "B").await;
    let a_id = a["id"].as_str().unwrap();
    let b_id = b["id"].as_str().unwrap();

    let mut engine = load_engine(&t.app, &token, &board_id).await;
    engine.start_card_drag(a_id).unwrap();
    assert!(engine.drag_over(b_id).unwrap());
    let commit = dropped(engine.release(Some(b_id)).unwrap());

    assert_eq!(send(&t.app, &token, &commit).await, StatusCode::NO_CONTENT);
    assert!(engine.store_mut().acknowledge(commit.seq));
    assert_eq!(engine.store().committed(), engine.lists());

    let view = get_board(&t.app, &token, &board_id).await;
    assert_eq!(
        cards_of(&view, "To Do"),
        vec![("B".to_string(), 0), ("A".to_string(), 1)]
    );
}

#[tokio::test]
async fn test_dragging_card_into_empty_list() {
    let t = setup_test_app().await;
    let token = register_user(&t.app, "owner@example.com", "Owner").await;
    let slug = create_organization(&t.app, &token, "Acme").await;
    let board_id = create_board(&t.app, &token, &slug, "Roadmap").await;
    let view = get_board(&t.app, &token, &board_id).await;
    let todo = list_id(&view, "To Do");
    let done = list_id(&view, "Done");
    let a = create_card(&t.app, &token, &todo, "A").await;
    create_card(&t.app, &token, &todo, "B").await;
    let c = create_card(&t.app, &token, &todo, "C").await;
    let c_id = c["id"].as_str().unwrap();

    let mut engine = load_engine(&t.app, &token, &board_id).await;
    engine.start_card_drag(c_id).unwrap();
    assert!(engine.drag_over(&done).unwrap());
    let commit = dropped(engine.release(Some(&done)).unwrap());

    assert_eq!(send(&t.app, &token, &commit).await, StatusCode::NO_CONTENT);
    engine.store_mut().acknowledge(commit.seq);

    let view = get_board(&t.app, &token, &board_id).await;
    assert_eq!(
        cards_of(&view, "To Do"),
        vec![("A".to_string(), 0), ("B".to_string(), 1)]
    );
    assert_eq!(cards_of(&view, "Done"), vec![("C".to_string(), 0)]);
    assert_eq!(a["order"], 0);
}

#[tokio::test]
async fn test_dragging_list_to_front() {
    let t = setup_test_app().await;
    let token = register_user(&t.app, "owner@example.com", "Owner").await;
    let slug = create_organization(&t.app, &token, "Acme").await;
    let board_id = create_board(&t.app, &token, &slug, "Roadmap").await;
    let view = get_board(&t.app, &token, &board_id).await;
    let todo = list_id(&view, "To Do");
    let done = list_id(&view, "Done");

    let mut engine = load_engine(&t.app, &token, &board_id).await;
    engine.start_list_drag(&done).unwrap();
    assert!(engine.drag_over(&todo).unwrap());
    let commit = dropped(engine.release(Some(&todo)).unwrap());

    assert_eq!(send(&t.app, &token, &commit).await, StatusCode::NO_CONTENT);

    let view = get_board(&t.app, &token, &board_id).await;
    let lists: Vec<(&str, i64)> = view["lists"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| (l["title"].as_str().unwrap(), l["order"].as_i64().unwrap()))
        .collect();
    assert_eq!(lists, vec![("Done", 0), ("To Do", 1), ("In Progress", 2)]);
}

#[tokio::test]
async fn test_rejected_commit_reverts_view() {
    let t = setup_test_app().await;
    let token = register_user(&t.app, "owner@example.com", "Owner").await;
    let slug = create_organization(&t.app, &token, "Acme").await;
    let board_id = create_board(&t.app, &token, &slug, "Roadmap").await;
    let view = get_board(&t.app, &token, &board_id).await;
    let todo = list_id(&view, "To Do");
    let a = create_card(&t.app, &token, &todo, "A").await;
    let b = create_card(&t.app, &token, &todo, "B").await;
    let a_id = a["id"].as_str().unwrap();
    let b_id = b["id"].as_str().unwrap();

    let mut engine = load_engine(&t.app, &token, &board_id).await;

    // B is deleted by someone else before the drop lands
    let (status, _) =
        json_request(&t.app, "DELETE", &format!("/api/cards/{}", b_id), None, &token).await;
    assert_eq!(status, StatusCode::OK);

    engine.start_card_drag(a_id).unwrap();
    engine.drag_over(b_id).unwrap();
    let commit = dropped(engine.release(Some(b_id)).unwrap());

    assert_eq!(send(&t.app, &token, &commit).await, StatusCode::NOT_FOUND);
    engine.store_mut().reject(commit.seq);

    let ids: Vec<&str> = engine.lists()[0].cards.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec![a_id, b_id]);

    let view = get_board(&t.app, &token, &board_id).await;
    assert_eq!(cards_of(&view, "To Do"), vec![("A".to_string(), 0)]);

    let fresh: BoardView = serde_json::from_value(view).unwrap();
    engine.store_mut().refresh(fresh);
    assert_eq!(engine.lists()[0].cards.len(), 1);
}
