// ABOUTME: Integration tests for the availability check against a local HTTP listener.
// ABOUTME: Verifies ready, timed-out, and unreachable outcomes.

mod support;

use edgeship::deploy::{Availability, AvailabilityCheck};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve every request with `status` until the test ends.
async fn serve(status: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    serve_on(listener, status);
    format!("http://{addr}")
}

fn serve_on(listener: TcpListener, status: &'static str) {
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response =
                    format!("HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
}

fn quick_check() -> AvailabilityCheck {
    AvailabilityCheck {
        timeout: Duration::from_millis(1500),
        interval: Duration::from_millis(100),
        ..AvailabilityCheck::default()
    }
}

#[tokio::test]
async fn ready_when_status_is_below_500() {
    support::init_tracing();
    let domain = serve("404 Not Found").await;

    let result = quick_check().poll(&domain).await;

    assert_eq!(result, Availability::Ready { status: 404 });
}

#[tokio::test]
async fn explicit_status_must_match_exactly() {
    let domain = serve("200 OK").await;
    let check = AvailabilityCheck {
        expected_status: Some(204),
        ..quick_check()
    };

    let result = check.poll(&domain).await;

    assert_eq!(
        result,
        Availability::TimedOut {
            last_status: Some(200)
        }
    );
}

#[tokio::test]
async fn server_errors_time_out_with_last_status() {
    let domain = serve("500 Internal Server Error").await;

    let result = quick_check().poll(&domain).await;

    assert_eq!(
        result,
        Availability::TimedOut {
            last_status: Some(500)
        }
    );
}

#[tokio::test]
async fn keeps_polling_until_a_late_listener_answers() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        let listener = TcpListener::bind(addr).await.unwrap();
        serve_on(listener, "200 OK");
    });

    let result = quick_check().poll(&format!("http://{addr}")).await;

    assert_eq!(result, Availability::Ready { status: 200 });
}

#[tokio::test]
async fn refused_connection_is_unreachable_at_the_deadline() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let started = std::time::Instant::now();
    let result = quick_check().poll(&format!("http://{addr}")).await;

    assert!(matches!(result, Availability::Unreachable(_)));
    assert!(started.elapsed() >= Duration::from_millis(1400));
}
