use serde_json::json;
use stkpoll::application::poller::{CheckoutPoller, PollerSettings};
use stkpoll::config::CheckoutConfig;
use stkpoll::domain::ports::PaymentGatewayBox;
use stkpoll::domain::session::SessionStatus;
use stkpoll::error::CheckoutError;
use stkpoll::infrastructure::http::HttpPaymentGateway;
use stkpoll::infrastructure::in_memory::{Script, ScriptedGateway};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

#[tokio::test(start_paused = true)]
async fn test_pending_pending_success_scenario() {
    let gateway = ScriptedGateway::new(
        Script::default()
            .accepting("SP1")
            .statuses(["Pending", "Pending", "Success"]),
    );
    let boxed: PaymentGatewayBox = Box::new(gateway.clone());
    let mut poller = CheckoutPoller::new(boxed, PollerSettings::default());
    let mut updates = poller.subscribe();

    let session = poller.initiate("tier1", "0712345678").await.unwrap();
    assert_eq!(session.status, SessionStatus::Pending);
    assert_eq!(session.countdown_seconds, 180);

    assert_eq!(poller.run().await, SessionStatus::Success);
    assert_eq!(gateway.status_calls().await, 3);

    let requests = gateway.initiation_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].plan, "tier1");
    assert_eq!(requests[0].phone_number.as_str(), "254712345678");

    let last = updates.borrow_and_update().clone();
    assert_eq!(last.status, SessionStatus::Success);
    assert_eq!(last.payment_id.as_deref(), Some("SP1"));
}

#[tokio::test(start_paused = true)]
async fn test_all_pending_until_timeout_scenario() {
    let gateway = ScriptedGateway::new(Script::default().accepting("SP1"));
    let mut poller = CheckoutPoller::new(Box::new(gateway.clone()), PollerSettings::default());

    poller.initiate("tier1", "254712345678").await.unwrap();
    assert_eq!(poller.run().await, SessionStatus::Timeout);

    // one request every 3s; the one due at 180s races the final tick
    let calls = gateway.status_calls().await;
    assert!((59..=60).contains(&calls), "{calls} status requests");
}

#[tokio::test]
async fn test_insufficient_balance_scenario() {
    let gateway = ScriptedGateway::new(Script::default().rejecting("Insufficient balance"));
    let mut poller = CheckoutPoller::new(Box::new(gateway), PollerSettings::default());

    let err = poller.initiate("tier1", "0712345678").await.unwrap_err();
    assert_eq!(err.to_string(), "Insufficient balance");
    assert_eq!(poller.session().status, SessionStatus::Failed);
    assert_eq!(
        poller.session().error_message.as_deref(),
        Some("Insufficient balance")
    );

    let session = poller.retry();
    assert_eq!(session.status, SessionStatus::Idle);
    assert_eq!(session.countdown_seconds, 180);
}

#[tokio::test]
async fn test_validation_happens_before_any_request() {
    let gateway = ScriptedGateway::new(Script::default().accepting("SP1"));
    let mut poller = CheckoutPoller::new(Box::new(gateway.clone()), PollerSettings::default());

    for phone in ["071234567", "+255712345678", "phone"] {
        let err = poller.initiate("tier1", phone).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)), "{phone}");
    }
    assert_eq!(gateway.initiate_calls().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_checkout_against_http_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/payments/stk-push-subscription/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::stk_push_accepted(json!(7))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/payments/subscription-payment-status/7/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::payment_status("Pending")))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/payments/subscription-payment-status/7/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::payment_status("Success")))
        .expect(1)
        .mount(&server)
        .await;

    let config = CheckoutConfig {
        api_base_url: format!("{}/api", server.uri()),
        ..Default::default()
    };
    let gateway = HttpPaymentGateway::new(&config).unwrap();
    let mut poller = CheckoutPoller::new(Box::new(gateway), common::quick_settings(30));

    poller.initiate("starter", "0712 345 678").await.unwrap();
    assert_eq!(poller.run().await, SessionStatus::Success);
    assert_eq!(poller.session().payment_id.as_deref(), Some("7"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_errors_while_polling_are_tolerated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::stk_push_accepted(json!("SP1"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::payment_status("Failed")))
        .mount(&server)
        .await;

    let config = CheckoutConfig {
        api_base_url: format!("{}/api", server.uri()),
        ..Default::default()
    };
    let gateway = HttpPaymentGateway::new(&config).unwrap();
    let mut poller = CheckoutPoller::new(Box::new(gateway), common::quick_settings(30));

    poller.initiate("starter", "0712345678").await.unwrap();
    assert_eq!(poller.run().await, SessionStatus::Failed);
}
