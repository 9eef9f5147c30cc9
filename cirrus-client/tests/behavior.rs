use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use cirrus_client::dav::types::Depth;
use cirrus_client::{Client, ClientConfig, Protocol};

const LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/share/</D:href>
    <D:propstat>
      <D:prop><D:resourcetype><D:collection/></D:resourcetype><D:getuniqueid>root1</D:getuniqueid></D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
  <D:response>
    <D:href>/share/music/</D:href>
    <D:propstat>
      <D:prop><D:resourcetype><D:collection/></D:resourcetype></D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
  <D:response>
    <D:href>/share/readme.txt</D:href>
    <D:propstat>
      <D:prop><D:resourcetype/><D:getcontentlength>42</D:getcontentlength></D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#;

const LOCK_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:prop xmlns:D="DAV:" xmlns:ns0="urn:uuid:c2f41010-65b3-11d1-a29f-00aa00c14882/">
<D:lockdiscovery>
<D:activelock>
<D:lockscope><D:exclusive/></D:lockscope>
<D:locktype><D:write/></D:locktype>
<D:depth>0</D:depth>
<D:timeout>Second-600</D:timeout>
<D:owner></D:owner>
<D:locktoken><D:href>opaquelocktoken:itest</D:href></D:locktoken>
</D:activelock>
</D:lockdiscovery>
</D:prop>"#;

#[derive(Default)]
struct ServerState {
    flaky_hits: AtomicUsize,
    broken_hits: AtomicUsize,
    last_propfind_depth: Mutex<Option<String>>,
    sequence: Mutex<Vec<String>>,
}

async fn spawn_server(state: Arc<ServerState>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let state = state.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let state = state.clone();
                    async move { Ok::<_, Infallible>(route(req, &state).await) }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(socket), service)
                    .await;
            });
        }
    });
    addr
}

fn text(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

fn xml(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/xml; charset=\"utf-8\"")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

async fn route(req: Request<Incoming>, state: &ServerState) -> Response<Full<Bytes>> {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let if_header = header("If");
    let lock_token_header = header("Lock-Token");
    let destination = header("Destination");
    let depth = header("Depth");
    let _body = req.into_body().collect().await.unwrap().to_bytes();

    match (method.as_str(), path.as_str()) {
        ("PROPFIND", "/share/") => {
            *state.last_propfind_depth.lock().unwrap() = depth;
            xml(StatusCode::MULTI_STATUS, LISTING)
        }
        ("LOCK", "/f.txt") => {
            state.sequence.lock().unwrap().push("LOCK".into());
            let mut resp = xml(StatusCode::OK, LOCK_BODY);
            resp.headers_mut().insert(
                "Lock-Token",
                "<opaquelocktoken:itest>".parse().unwrap(),
            );
            resp
        }
        ("MOVE", "/f.txt") => {
            state.sequence.lock().unwrap().push("MOVE".into());
            let token_ok = if_header.as_deref() == Some("<opaquelocktoken:itest>");
            let dest_ok = destination.as_deref().is_some_and(|d| d.ends_with("/g.txt"));
            if token_ok && dest_ok {
                text(StatusCode::CREATED, "")
            } else {
                text(StatusCode::PRECONDITION_FAILED, "bad MOVE headers")
            }
        }
        ("UNLOCK", "/f.txt") => {
            state.sequence.lock().unwrap().push("UNLOCK".into());
            if lock_token_header.as_deref() == Some("<opaquelocktoken:itest>") {
                text(StatusCode::NO_CONTENT, "")
            } else {
                text(StatusCode::BAD_REQUEST, "missing Lock-Token")
            }
        }
        ("DELETE", p) if p.starts_with("/seq/") => {
            state.sequence.lock().unwrap().push(p.to_string());
            text(StatusCode::NO_CONTENT, "")
        }
        ("GSL", "/") => text(
            StatusCode::OK,
            "<result><sharelink>http://r.local/Gv7Qx2b4/f.txt</sharelink></result>",
        ),
        ("GET", "/flaky") => {
            if state.flaky_hits.fetch_add(1, Ordering::SeqCst) == 0 {
                text(StatusCode::NOT_IMPLEMENTED, "")
            } else {
                text(StatusCode::OK, "ok after retry")
            }
        }
        ("GET", "/broken") => {
            state.broken_hits.fetch_add(1, Ordering::SeqCst);
            text(StatusCode::NOT_IMPLEMENTED, "still broken")
        }
        ("GET", "/secret") => text(StatusCode::UNAUTHORIZED, "auth required"),
        _ => text(StatusCode::NOT_FOUND, "not found"),
    }
}

async fn client_for(state: Arc<ServerState>) -> Client {
    let addr = spawn_server(state).await;
    let config = ClientConfig::new(Protocol::Http, addr.ip().to_string(), Some(addr.port()))
        .with_auth("admin", "admin")
        .accept_invalid_certs(true);
    Client::new(config).unwrap()
}

#[tokio::test]
async fn propfind_builds_listing_tree() {
    let state = Arc::new(ServerState::default());
    let client = client_for(state.clone()).await;

    let resp = client
        .propfind("/share/", Some(Depth::One), None, None)
        .await
        .unwrap();
    assert_eq!(resp.status, StatusCode::MULTI_STATUS);

    let root = resp.tree().unwrap();
    assert_eq!(root.href, "/share/");
    assert!(root.is_collection());
    assert_eq!(root.items.len(), 2);
    assert_eq!(root.items[0].name(), "music");
    assert_eq!(root.items[1].name(), "readme.txt");
    assert_eq!(root.items[1].content_length(), Some(42));

    assert_eq!(
        state.last_propfind_depth.lock().unwrap().as_deref(),
        Some("1")
    );
}

#[tokio::test]
async fn move_locked_runs_lock_move_unlock_in_order() {
    let state = Arc::new(ServerState::default());
    let client = client_for(state.clone()).await;

    let resp = client
        .move_locked("/f.txt", "/g.txt", Some(true))
        .await
        .unwrap();
    assert_eq!(resp.status, StatusCode::CREATED);

    let sequence = state.sequence.lock().unwrap().clone();
    assert_eq!(sequence, ["LOCK", "MOVE", "UNLOCK"]);
}

#[tokio::test]
async fn lock_answer_delivers_token_from_body() {
    let state = Arc::new(ServerState::default());
    let client = client_for(state).await;

    let resp = client
        .lock("/f.txt", "http://owner/", Default::default())
        .await
        .unwrap();
    assert_eq!(resp.status, StatusCode::OK);
    let info = resp.lock().unwrap();
    assert_eq!(info.token(), Some("opaquelocktoken:itest"));
    assert_eq!(info.timeout.as_deref(), Some("Second-600"));
}

#[tokio::test]
async fn not_implemented_is_retried_exactly_once() {
    let state = Arc::new(ServerState::default());
    let client = client_for(state.clone()).await;

    // recovers on the retry
    let resp = client.get("/flaky").await.unwrap();
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.text().as_deref(), Some("ok after retry"));
    assert_eq!(state.flaky_hits.load(Ordering::SeqCst), 2);

    // still failing: delivered as-is after one retry, no loop
    let resp = client.get("/broken").await.unwrap();
    assert_eq!(resp.status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(state.broken_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn deletes_run_strictly_in_order() {
    let state = Arc::new(ServerState::default());
    let client = client_for(state.clone()).await;

    let responses = client
        .delete_all(&["/seq/a", "/seq/b", "/seq/c"])
        .await
        .unwrap();
    assert_eq!(responses.len(), 3);
    assert!(responses.iter().all(|r| r.status == StatusCode::NO_CONTENT));

    let sequence = state.sequence.lock().unwrap().clone();
    assert_eq!(sequence, ["/seq/a", "/seq/b", "/seq/c"]);
}

#[tokio::test]
async fn share_link_answer_is_delivered_raw() {
    let state = Arc::new(ServerState::default());
    let client = client_for(state).await;

    let resp = client.gsl("/", "/share/f.txt", "f.txt", 0, 0).await.unwrap();
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.text().unwrap();
    assert!(body.contains("<sharelink>"));
}

#[tokio::test]
async fn unauthorized_surfaces_for_the_caller() {
    let state = Arc::new(ServerState::default());
    let client = client_for(state).await;

    let resp = client.get("/secret").await.unwrap();
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    let err = resp.error_for_status().unwrap_err();
    assert!(err.is_unauthorized());
}
