use crate::integration::create_test_session;
use crate::utils::{TransportCall, next_session_event, settle, wait_until};
use huddle_client::session::SessionEvent;
use huddle_client::signaling::ChannelEvent;
use huddle_core::model::{Message, PeerId};

#[tokio::test]
async fn room_closed_terminates_the_whole_session() {
    let mut session = create_test_session().await;
    let bob = PeerId::from("bob");

    session.channel.deliver(Message::offer_request(bob.clone())).await;
    let _connect = next_session_event(&mut session.events).await;

    session.channel.deliver(Message::room_closed()).await;

    match next_session_event(&mut session.events).await {
        SessionEvent::RoomClosed => {}
        other => panic!("unexpected event: {other:?}"),
    }

    session
        .task
        .await
        .expect("session task panicked")
        .expect("session returned an error");
    assert!(session.channel.is_closed());

    let transport = session.factory.transport_for(&bob);
    wait_until(move || transport.count(|c| matches!(c, TransportCall::Close)) == 1).await;
}

#[tokio::test]
async fn channel_errors_do_not_tear_down_connections() {
    let mut session = create_test_session().await;
    let bob = PeerId::from("bob");

    session.channel.deliver(Message::offer_request(bob.clone())).await;
    let _connect = next_session_event(&mut session.events).await;

    session
        .channel
        .push(ChannelEvent::Error("relay hiccup".to_owned()))
        .await;

    match next_session_event(&mut session.events).await {
        SessionEvent::Error(reason) => assert_eq!(reason, "relay hiccup"),
        other => panic!("unexpected event: {other:?}"),
    }

    settle().await;
    assert!(!session.task.is_finished(), "session must survive relay errors");
    assert_eq!(
        session
            .factory
            .transport_for(&bob)
            .count(|c| matches!(c, TransportCall::Close)),
        0,
        "established connections must stay up"
    );
}

#[tokio::test]
async fn explicit_close_shuts_everything_down() {
    let mut session = create_test_session().await;
    let bob = PeerId::from("bob");

    session.channel.deliver(Message::offer_request(bob.clone())).await;
    let _connect = next_session_event(&mut session.events).await;

    session.handle.close().await;

    session
        .task
        .await
        .expect("session task panicked")
        .expect("session returned an error");
    assert!(session.channel.is_closed());
    let transport = session.factory.transport_for(&bob);
    wait_until(move || transport.count(|c| matches!(c, TransportCall::Close)) == 1).await;
}
