//! HttpBackend against a canned HTTP server on a local port: endpoint
//! paths, query parameters, and decoding of real-shaped payloads.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use parliament::{HttpBackend, PaperId, ParliamentBackend, SpeakerRole, VoteResult};

struct Route {
    request_line: &'static str,
    status: u16,
    body: &'static str,
}

/// Serve `routes` until the test ends. Returns the base URL and the request
/// lines received.
async fn serve(routes: Vec<Route>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let routes = Arc::new(routes);

    let log = seen.clone();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let routes = routes.clone();
            let log = log.clone();
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                let request_line = request.lines().next().unwrap_or_default().to_string();
                log.lock().unwrap().push(request_line.clone());

                let (status, body) = routes
                    .iter()
                    .find(|r| request_line.starts_with(r.request_line))
                    .map(|r| (r.status, r.body))
                    .unwrap_or((404, r#"{"detail":"not found"}"#));
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}", addr), seen)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn backend(base_url: &str) -> HttpBackend {
    HttpBackend::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_import_posts_with_max_results() {
    let (url, seen) = serve(vec![Route {
        request_line: "POST /papers/arxiv/import?max_results=6 ",
        status: 200,
        body: r#"[{"id": 12, "title": "Frontier model licensing", "status": "imported"},
                 {"id": "13", "title": "Open weights and liability", "summary": "Who pays?"}]"#,
    }])
    .await;

    let papers = backend(&url).import_papers("arxiv", 6).await.unwrap();
    assert_eq!(papers.len(), 2);
    assert_eq!(papers[0].id, PaperId::new("12"));
    assert_eq!(papers[0].source, "arxiv");
    assert_eq!(papers[1].summary, "Who pays?");
    assert!(seen.lock().unwrap()[0].starts_with("POST /papers/arxiv/import?max_results=6"));
}

#[tokio::test]
async fn test_full_debate_is_decoded_in_order() {
    let (url, _) = serve(vec![Route {
        request_line: "POST /debates/12/start-full-debate ",
        status: 200,
        body: r##"{
            "debate_id": 77,
            "responses": [
                {"mp_role": "corporate", "content": "Innovation first.", "color": "#DA0211"},
                {"mp_role": "Civil Rights Advocates", "content": "Fairness first."}
            ],
            "summary": {"for": 1, "against": 0, "abstain": 3, "total": 4, "result": "passed"}
        }"##,
    }])
    .await;

    let transcript = backend(&url)
        .start_full_debate(&PaperId::new("12"))
        .await
        .unwrap();
    assert_eq!(transcript.debate_id.as_str(), "77");
    assert_eq!(transcript.paper_id, PaperId::new("12"));
    assert_eq!(transcript.messages.len(), 2);
    assert_eq!(transcript.messages[0].ordinal, 1);
    assert_eq!(transcript.messages[1].speaker_role, SpeakerRole::CivilRights);
    assert_eq!(
        transcript.messages[1].color_tag,
        SpeakerRole::CivilRights.profile().accent_color
    );
    assert_eq!(transcript.summary.total, 4);
    assert_eq!(transcript.summary.result, VoteResult::Passed);
}

#[tokio::test]
async fn test_server_error_on_debate_is_generation_error() {
    let (url, _) = serve(vec![Route {
        request_line: "POST /debates/5/start-full-debate ",
        status: 500,
        body: r#"{"detail":"model crashed"}"#,
    }])
    .await;

    let err = backend(&url)
        .start_full_debate(&PaperId::new("5"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "DEBATE_GENERATION");
}

#[tokio::test]
async fn test_inconsistent_summary_is_malformed() {
    let (url, _) = serve(vec![Route {
        request_line: "POST /debates/6/start-full-debate ",
        status: 200,
        body: r#"{"debate_id": "d6", "responses": [],
                  "summary": {"for": 1, "against": 1, "abstain": 1, "total": 9}}"#,
    }])
    .await;

    let err = backend(&url)
        .start_full_debate(&PaperId::new("6"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "MALFORMED_RESPONSE");
}

#[tokio::test]
async fn test_get_paper_and_health() {
    let (url, _) = serve(vec![
        Route {
            request_line: "GET /papers/12 ",
            status: 200,
            body: r#"{"id": 12, "title": "Frontier model licensing", "summary": "Licensing regime", "source": "arxiv", "url": "https://arxiv.org/abs/1"}"#,
        },
        Route {
            request_line: "GET /health ",
            status: 200,
            body: r#"{"status": "healthy"}"#,
        },
    ])
    .await;

    let backend = backend(&url);
    let paper = backend.get_paper(&PaperId::new("12")).await.unwrap();
    assert_eq!(paper.title, "Frontier model licensing");
    assert_eq!(paper.url.as_deref(), Some("https://arxiv.org/abs/1"));
    assert_eq!(backend.health().await.unwrap(), "healthy");

    let err = backend.get_paper(&PaperId::new("404")).await.unwrap_err();
    assert_eq!(err.code(), "NETWORK");
}
