// End-to-end flows across users and tasks.

mod common;

use axum::http::{Method, StatusCode};
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_complete_task_management_workflow() {
    let app = test_app().await;

    // Create a user with three tasks.
    let user_id = create_user(&app, "John Doe", "john.doe@example.com").await;
    let mut task_ids = Vec::new();
    for (title, description) in [
        ("Buy groceries", "Milk, eggs, bread"),
        ("Finish project", "Complete the API"),
        ("Gym workout", "Chest and triceps"),
    ] {
        let (status, body) = post(
            &app,
            "/api/tasks/",
            json!({ "title": title, "description": description, "user": user_id }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["is_completed"], false);
        task_ids.push(body["id"].as_i64().unwrap());
    }

    let (status, body) = get(&app, &format!("/api/users/{user_id}/tasks/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    // Edit the first task, then complete it with toggle and the second with PATCH.
    let (status, body) = patch(
        &app,
        &format!("/api/tasks/{}/", task_ids[0]),
        json!({ "title": "Buy groceries (UPDATED)", "description": "Milk, eggs, bread, cheese" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Buy groceries (UPDATED)");
    assert_eq!(body["description"], "Milk, eggs, bread, cheese");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/tasks/{}/toggle_completion/", task_ids[0]),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_completed"], true);

    let (status, body) = patch(
        &app,
        &format!("/api/tasks/{}/", task_ids[1]),
        json!({ "is_completed": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_completed"], true);

    let (_, completed) = get(&app, "/api/tasks/completed/").await;
    assert_eq!(completed.as_array().unwrap().len(), 2);
    let (_, pending) = get(&app, "/api/tasks/pending/").await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, body) = get(&app, "/api/tasks/").await;
    assert_eq!(status, StatusCode::OK);
    let tasks = body["results"].as_array().unwrap();
    assert_eq!(tasks.iter().filter(|t| t["is_completed"] == true).count(), 2);
    assert_eq!(tasks.iter().filter(|t| t["is_completed"] == false).count(), 1);

    // Delete one task, then the user; the remaining tasks go with it.
    let (status, _) = delete(&app, &format!("/api/tasks/{}/", task_ids[2])).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = get(&app, &format!("/api/users/{user_id}/tasks/")).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = delete(&app, &format!("/api/users/{user_id}/")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get(&app, &format!("/api/users/{user_id}/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&app, &format!("/api/tasks/{}/", task_ids[0])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_multiple_users_with_separate_tasks() {
    let app = test_app().await;
    let alice = create_user(&app, "Alice", "alice@example.com").await;
    let bob = create_user(&app, "Bob", "bob@example.com").await;

    for i in 1..=3 {
        create_task(&app, alice, &format!("Alice Task {i}")).await;
    }
    for i in 1..=2 {
        create_task(&app, bob, &format!("Bob Task {i}")).await;
    }

    let (_, alice_tasks) = get(&app, &format!("/api/users/{alice}/tasks/")).await;
    let (_, bob_tasks) = get(&app, &format!("/api/users/{bob}/tasks/")).await;
    let alice_tasks = alice_tasks.as_array().unwrap();
    let bob_tasks = bob_tasks.as_array().unwrap();

    assert_eq!(alice_tasks.len(), 3);
    assert_eq!(bob_tasks.len(), 2);
    assert!(alice_tasks.iter().all(|t| t["title"].as_str().unwrap().contains("Alice")));
    assert!(bob_tasks.iter().all(|t| t["user_name"] == "Bob"));
}
