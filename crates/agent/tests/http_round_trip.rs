//! End-to-end: a worker pool talking HTTP to a real orchestrator router.

use std::sync::Arc;
use std::time::Duration;

use calc_agent::{OrchestratorClient, TaskSource, WorkerPool};
use calc_core::config::AgentConfig;
use calc_core::{Config, OperationTimes};
use calc_server::{build_router, AppState};
use serde_json::{json, Value};

async fn spawn_server() -> String {
    let mut config = Config::for_profile("");
    config.operations = OperationTimes::instant();
    let app = build_router(Arc::new(AppState::new(config)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn agent_config(url: &str) -> AgentConfig {
    AgentConfig {
        orchestrator_url: url.to_string(),
        computing_power: 2,
        poll_interval_ms: 10,
        dependency_backoff_ms: 5,
        simulate_duration: false,
    }
}

async fn wait_result(http: &reqwest::Client, url: &str, id: &str) -> Value {
    for _ in 0..300 {
        let body: Value = http
            .get(format!("{}/api/v1/expressions/{}", url, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if body["expression"]["status"] == "done" {
            return body["expression"].clone();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expression {id} did not finish");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pool_over_http() {
    let url = spawn_server().await;
    let http = reqwest::Client::new();

    let client = OrchestratorClient::new(&url).unwrap();
    client.health_check().await.unwrap();
    let pool = WorkerPool::start(2, Arc::new(client), &agent_config(&url));

    let mut ids = Vec::new();
    for expr in ["(1+2)*(3-1)", "2+3*4", "-(3+4)", "10/4-0.5"] {
        let resp = http
            .post(format!("{}/api/v1/calculate", url))
            .json(&json!({ "expression": expr }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201);
        let body: Value = resp.json().await.unwrap();
        ids.push(body["id"].as_str().unwrap().to_string());
    }

    let results: Vec<f64> = {
        let mut out = Vec::new();
        for id in &ids {
            out.push(wait_result(&http, &url, id).await["result"].as_f64().unwrap());
        }
        out
    };
    assert_eq!(results, vec![6.0, 14.0, -7.0, 2.0]);

    pool.shutdown().await;
}

#[tokio::test]
async fn client_maps_empty_queue_and_unknown_ids() {
    let url = spawn_server().await;
    let client = OrchestratorClient::new(&url).unwrap();

    assert!(client.next_task().await.unwrap().is_none());
    assert!(client.task_status("123").await.unwrap().is_none());

    let err = client
        .submit_result(&calc_core::TaskResult { id: "123".into(), result: 1.0 })
        .await
        .unwrap_err();
    assert!(matches!(err, calc_agent::AgentError::UnknownTask(_)));
}

#[tokio::test]
async fn unreachable_orchestrator_is_transport_error() {
    // Port 9 (discard) is not served by anything in the test environment.
    let client = OrchestratorClient::new("http://127.0.0.1:9").unwrap();
    assert!(matches!(
        client.next_task().await,
        Err(calc_agent::AgentError::Transport(_))
    ));
}
