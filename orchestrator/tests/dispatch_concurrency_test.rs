//! Claim exclusivity and end-to-end scheduling under concurrent callers

mod support;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use futures::future::join_all;
use serde_json::json;
use shared_types::{ExpressionStatus, TaskReport};

use orchestrator::scheduler::{OperationLatency, Scheduler};
use support::{get, json_response, post_json, setup_test_app};

fn scheduler() -> Arc<Scheduler> {
    Arc::new(Scheduler::new(OperationLatency::uniform(Duration::from_millis(1))))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_single_ready_node_is_claimed_once() {
    let (app, _state) = setup_test_app();
    json_response(
        &app,
        post_json("/api/v1/calculate", json!({ "expression": "2+3" })),
    )
    .await;

    let claims = (0..64).map(|_| {
        let app = app.clone();
        tokio::spawn(async move { json_response(&app, get("/internal/task")).await })
    });
    let results = join_all(claims).await;

    let statuses: Vec<StatusCode> = results
        .into_iter()
        .map(|joined| joined.expect("claim task panicked").0)
        .collect();
    let ok = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let not_found = statuses
        .iter()
        .filter(|s| **s == StatusCode::NOT_FOUND)
        .count();
    assert_eq!(ok, 1);
    assert_eq!(not_found, 63);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_leaves_are_each_claimed_once() {
    let scheduler = scheduler();
    // Eight independent additions at level 1.
    scheduler
        .submit("(1+1)*(2+2)*(3+3)*(4+4)*(5+5)*(6+6)*(7+7)*(8+8)")
        .await
        .unwrap();

    let claims = (0..32).map(|_| {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.claim().await })
    });
    let claimed: Vec<u64> = join_all(claims)
        .await
        .into_iter()
        .filter_map(|joined| joined.expect("claim task panicked").unwrap())
        .map(|task| task.id)
        .collect();

    let unique: HashSet<u64> = claimed.iter().copied().collect();
    assert_eq!(claimed.len(), 8);
    assert_eq!(unique.len(), 8);
}

/// Many pollers drain several expressions; every expression finishes with
/// the right value and no node is ever reported twice.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_workers_drain_queue() {
    let scheduler = scheduler();
    let expected = [
        ("2+3*4", 14.0),
        ("(2+3)*4", 20.0),
        ("100/4-5", 20.0),
        ("1+2+3+4+5+6", 21.0),
        ("9", 9.0),
        ("((8-2)*(3+1))/(2*3)", 4.0),
    ];
    let mut ids = Vec::new();
    for (text, _) in expected {
        ids.push(scheduler.submit(text).await.unwrap().id);
    }

    let workers = (0..6).map(|_| {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move {
            let mut reported = Vec::new();
            loop {
                if scheduler.queue_len().await == 0 {
                    return reported;
                }
                let Some(task) = scheduler.claim().await.unwrap() else {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    continue;
                };
                let result = match task.operation.as_str() {
                    "+" => task.arg1 + task.arg2,
                    "-" => task.arg1 - task.arg2,
                    "*" => task.arg1 * task.arg2,
                    "/" => task.arg1 / task.arg2,
                    other => panic!("unexpected operation {other}"),
                };
                scheduler
                    .report(&TaskReport::success(task.id, result))
                    .await
                    .unwrap();
                reported.push(task.id);
            }
        })
    });

    let drained = tokio::time::timeout(Duration::from_secs(10), join_all(workers))
        .await
        .expect("workers did not drain the queue");
    for joined in drained {
        joined.expect("worker panicked");
    }

    for (id, (text, value)) in ids.into_iter().zip(expected) {
        let detail = scheduler.detail(id).await.unwrap();
        assert_eq!(detail.status, ExpressionStatus::Done, "{text}");
        assert_eq!(detail.result, value, "{text}");
    }
}
