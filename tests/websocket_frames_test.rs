// ABOUTME: Integration tests for the streaming frame handler
// ABOUTME: Drives handle_text_frame directly through registered channel senders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{create_test_resources, oversized_payload, sample_routine};
use gymkit::websocket::handle_text_frame;
use serde_json::{json, Value};
use tokio::sync::mpsc;

#[tokio::test]
async fn ping_gets_pong_without_touching_the_store() {
    let (resources, _mocks) = create_test_resources().await.unwrap();
    let id = resources
        .database
        .create_routine(&sample_routine("Base", 2), 1)
        .await
        .unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    handle_text_frame(&resources, id, r#"{"type":"ping"}"#, &tx).await;

    assert_eq!(rx.recv().await.unwrap(), r#"{"type":"pong"}"#);
    assert!(resources.database.get_chat_history(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn chat_frame_broadcasts_routine_update_to_all_subscribers() {
    let (resources, _mocks) = create_test_resources().await.unwrap();
    let id = resources
        .database
        .create_routine(&sample_routine("Base", 2), 1)
        .await
        .unwrap();

    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    resources.registry.admit(id, tx_a.clone()).await;
    resources.registry.admit(id, tx_b).await;

    handle_text_frame(&resources, id, "rename it", &tx_a).await;

    for rx in [&mut rx_a, &mut rx_b] {
        let frame: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame["type"], "routine_update");
        assert_eq!(frame["routine"]["routine_name"], "Base (edited)");
        assert_eq!(frame["explanation"], "I renamed your routine.");
    }
}

#[tokio::test]
async fn error_goes_only_to_the_offending_connection() {
    let (resources, _mocks) = create_test_resources().await.unwrap();

    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    // Both register for an absent routine; only the sender sees the error.
    resources.registry.admit(404, tx_a.clone()).await;
    resources.registry.admit(404, tx_b).await;

    handle_text_frame(&resources, 404, "edit this", &tx_a).await;

    let frame: Value = serde_json::from_str(&rx_a.recv().await.unwrap()).unwrap();
    assert!(frame["error"].as_str().unwrap().contains("Routine 404"));
    assert!(rx_b.try_recv().is_err());
}

#[tokio::test]
async fn analyze_image_frame_broadcasts_analysis() {
    let (resources, _mocks) = create_test_resources().await.unwrap();
    let id = resources
        .database
        .create_routine(&sample_routine("Base", 2), 1)
        .await
        .unwrap();

    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    resources.registry.admit(id, tx_a.clone()).await;
    resources.registry.admit(id, tx_b).await;

    let frame = json!({
        "type": "analyze_image",
        "image_data": common::png_payload(),
        "exercise_name": "squat",
    });
    handle_text_frame(&resources, id, &frame.to_string(), &tx_a).await;

    for rx in [&mut rx_a, &mut rx_b] {
        let frame: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame["type"], "image_analysis");
        assert_eq!(frame["analysis"], "Form analysis for squat");
    }
}

#[tokio::test]
async fn rejected_image_still_flows_as_analysis_text() {
    let (resources, mocks) = create_test_resources().await.unwrap();
    let id = resources
        .database
        .create_routine(&sample_routine("Base", 2), 1)
        .await
        .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    resources.registry.admit(id, tx.clone()).await;

    let frame = json!({
        "type": "analyze_image",
        "image_data": oversized_payload(),
    });
    handle_text_frame(&resources, id, &frame.to_string(), &tx).await;

    let frame: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(frame["type"], "image_analysis");
    assert!(frame["analysis"].as_str().unwrap().contains("too large"));
    assert_eq!(
        mocks.analyzer.calls.load(std::sync::atomic::Ordering::SeqCst),
        0
    );
}

#[tokio::test]
async fn analyze_image_without_payload_answers_sender_and_mutates_nothing() {
    let (resources, mocks) = create_test_resources().await.unwrap();
    let id = resources
        .database
        .create_routine(&sample_routine("Base", 2), 1)
        .await
        .unwrap();

    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    resources.registry.admit(id, tx_a.clone()).await;
    resources.registry.admit(id, tx_b).await;

    handle_text_frame(&resources, id, r#"{"type":"analyze_image"}"#, &tx_a).await;

    let frame: Value = serde_json::from_str(&rx_a.recv().await.unwrap()).unwrap();
    assert!(frame["error"].as_str().unwrap().contains("image_data"));
    assert!(rx_b.try_recv().is_err());

    assert_eq!(
        mocks.generator.calls.load(std::sync::atomic::Ordering::SeqCst),
        0
    );
    assert!(resources.database.get_chat_history(id).await.unwrap().is_empty());
    let stored = resources.database.get_routine(id).await.unwrap().unwrap();
    assert_eq!(stored.routine_name, "Base");
}

#[tokio::test]
async fn plain_text_with_json_snippets_is_treated_as_chat() {
    let (resources, _mocks) = create_test_resources().await.unwrap();
    let id = resources
        .database
        .create_routine(&sample_routine("Base", 2), 1)
        .await
        .unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    resources.registry.admit(id, tx.clone()).await;

    handle_text_frame(&resources, id, r#"{"type":"unknown_tag"}"#, &tx).await;

    let frame: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(frame["type"], "routine_update");

    let history = resources.database.get_chat_history(id).await.unwrap();
    assert_eq!(history[0].content, r#"{"type":"unknown_tag"}"#);
}
