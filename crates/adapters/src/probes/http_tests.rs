// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

async fn serve_once(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
        }
    });
    format!("http://127.0.0.1:{port}/")
}

#[tokio::test]
async fn channel_build_id_is_plain_text() {
    let url = serve_once("1001\n").await;
    let probe = HttpLatestProbe::new(LatestEndpoints {
        release: Some(url),
        ..Default::default()
    });
    assert_eq!(
        probe.latest(Component::Release).await,
        VersionInfo::Version("1001".into())
    );
}

#[tokio::test]
async fn plugin_tag_comes_from_release_feed() {
    let url = serve_once(r#"{"tag_name":"v2.0.1","name":"Relay 2.0.1"}"#).await;
    let probe = HttpLatestProbe::new(LatestEndpoints {
        relay: Some(url),
        ..Default::default()
    });
    assert_eq!(
        probe.latest(Component::CommandRelay).await,
        VersionInfo::Version("v2.0.1".into())
    );
}

#[tokio::test]
async fn release_feed_array_takes_newest() {
    let url = serve_once(r#"[{"tag_name":"1.2.3"},{"tag_name":"1.2.2"}]"#).await;
    let probe = HttpLatestProbe::new(LatestEndpoints {
        launchpad: Some(url),
        ..Default::default()
    });
    assert_eq!(
        probe.latest(Component::LaunchPad).await,
        VersionInfo::Version("1.2.3".into())
    );
}

#[tokio::test]
async fn unconfigured_component_is_unknown() {
    let probe = HttpLatestProbe::new(LatestEndpoints::default());
    assert_eq!(probe.latest(Component::Release).await, VersionInfo::Unknown);
    assert_eq!(probe.latest(Component::SteamCmd).await, VersionInfo::Unknown);
}

#[tokio::test]
async fn fetch_failure_without_history_is_unknown() {
    // Bind-then-drop: nothing listens here.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://127.0.0.1:{}/", listener.local_addr().unwrap().port());
    drop(listener);

    let probe = HttpLatestProbe::new(LatestEndpoints {
        beta: Some(url),
        ..Default::default()
    });
    assert_eq!(probe.latest(Component::Beta).await, VersionInfo::Unknown);
}

#[tokio::test]
async fn fetch_failure_falls_back_to_last_good() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let url = format!("http://127.0.0.1:{port}/");

    // First request succeeds...
    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let body = "2002";
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
        }
        // ...then the listener goes away.
    });

    let probe = HttpLatestProbe::new(LatestEndpoints {
        beta: Some(url),
        ..Default::default()
    });
    assert_eq!(probe.latest(Component::Beta).await, VersionInfo::Version("2002".into()));

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(
        probe.latest(Component::Beta).await,
        VersionInfo::Version("2002".into()),
        "remote failure serves the last good answer"
    );
}

#[yare::parameterized(
    object  = { r#"{"tag_name":"v1"}"#, Some("v1") },
    array   = { r#"[{"tag_name":"v2"}]"#, Some("v2") },
    empty   = { r#"{"tag_name":""}"#, None },
    missing = { r#"{"name":"x"}"#, None },
    garbage = { "not json", None },
)]
fn tag_parsing(body: &str, expected: Option<&str>) {
    assert_eq!(parse_tag(body).as_deref(), expected);
}
