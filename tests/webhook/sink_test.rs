//! Delivery outcomes against a live HTTP endpoint.

use ghost_monitor::sink::{DeliveryResult, NotificationSink, SuccessPolicy, WebhookSink};

use crate::support::WebhookServer;

#[tokio::test]
async fn test_204_is_delivered_with_content_payload() {
    let server = WebhookServer::start(204).await;
    let sink = WebhookSink::new(SuccessPolicy::Strict).unwrap();

    let result = sink.deliver(&server.url, "Game created: Dust2 FFA").await;

    assert_eq!(result, DeliveryResult::Delivered { status: 204 });
    assert_eq!(
        server.bodies(),
        vec![serde_json::json!({"content": "Game created: Dust2 FFA"})]
    );
}

#[tokio::test]
async fn test_500_is_rejected_with_body() {
    let server = WebhookServer::start(500).await;
    let sink = WebhookSink::new(SuccessPolicy::Strict).unwrap();

    let result = sink.deliver(&server.url, "hello").await;

    assert_eq!(
        result,
        DeliveryResult::Rejected {
            status: 500,
            body: "server said no".to_string()
        }
    );
}

#[tokio::test]
async fn test_200_depends_on_policy() {
    let server = WebhookServer::start(200).await;

    let strict = WebhookSink::new(SuccessPolicy::Strict).unwrap();
    assert!(matches!(
        strict.deliver(&server.url, "a").await,
        DeliveryResult::Rejected { status: 200, .. }
    ));

    let lenient = WebhookSink::new(SuccessPolicy::Lenient).unwrap();
    assert_eq!(
        lenient.deliver(&server.url, "b").await,
        DeliveryResult::Delivered { status: 200 }
    );

    // 204 stays a success under the lenient policy too.
    server.respond_with(204);
    assert!(lenient.deliver(&server.url, "c").await.is_delivered());
    assert_eq!(server.contents(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_server_gone_is_transport_failure() {
    let server = WebhookServer::start(204).await;
    let url = server.url.clone();
    drop(server);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let sink = WebhookSink::new(SuccessPolicy::Strict).unwrap();
    assert!(matches!(
        sink.deliver(&url, "lost").await,
        DeliveryResult::TransportFailure(_)
    ));
}
