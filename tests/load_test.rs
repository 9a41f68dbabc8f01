//! Load testing for the router.

use std::time::Instant;

use waypost::Server;

mod common;

#[tokio::test]
async fn test_load_performance() {
    // 1. Setup Server
    let mut server = Server::new();
    server
        .get("/users/:id", |req, res, caps| {
            let id = caps.named("id").unwrap_or_default();
            let page = req.param("page").unwrap_or("1");
            res.plain(format!("{id}:{page}"), None)
        })
        .unwrap();
    let handle = common::start(server).await;

    // 2. Run Load Test
    let concurrency = 20;
    let requests_per_task = 50;
    let total_requests = concurrency * requests_per_task;

    let client = common::client();
    let start = Instant::now();

    let mut tasks = Vec::new();
    for task_id in 0..concurrency {
        let client = client.clone();
        let base = common::url(&handle, "/users");
        tasks.push(tokio::spawn(async move {
            let mut latencies = Vec::new();
            for i in 0..requests_per_task {
                let req_start = Instant::now();
                let url = format!("{base}/{task_id}?page={i}");
                if let Ok(res) = client.get(&url).send().await {
                    if res.status().is_success() {
                        if let Ok(body) = res.text().await {
                            assert_eq!(body, format!("{task_id}:{i}"));
                            latencies.push(req_start.elapsed());
                        }
                    }
                }
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.unwrap());
    }

    let duration = start.elapsed();
    let rps = total_requests as f64 / duration.as_secs_f64();

    assert_eq!(all_latencies.len(), total_requests, "every request should succeed");

    all_latencies.sort();
    let p50 = all_latencies[all_latencies.len() / 2];
    let p99 = all_latencies[(all_latencies.len() as f64 * 0.99) as usize];

    println!("\n--- Load Test Results ---");
    println!("Total Requests: {}", total_requests);
    println!("Concurrency:    {}", concurrency);
    println!("Total Duration: {:?}", duration);
    println!("Requests/sec:   {:.2}", rps);
    println!("P50 Latency:    {:?}", p50);
    println!("P99 Latency:    {:?}", p99);
    println!("-------------------------\n");

    handle.shutdown().await.unwrap();
}
