use crate::integration::create_test_session;
use crate::utils::{TransportCall, next_session_event, settle, wait_until};
use huddle_client::session::SessionEvent;
use huddle_core::model::{Message, PeerId};

#[tokio::test]
async fn mute_sends_one_token_per_peer_and_nothing_to_the_relay() {
    let mut session = create_test_session().await;
    let peers = ["alice", "bob", "carol"];

    for name in peers {
        session
            .channel
            .deliver(Message::offer_request(PeerId::from(name)))
            .await;
        match next_session_event(&mut session.events).await {
            SessionEvent::Connect { .. } => {}
            other => panic!("unexpected event: {other:?}"),
        }
    }

    // Wait for the three offers so the engines are demonstrably running.
    let channel = session.channel.clone();
    wait_until(move || channel.sent().iter().filter(|m| m.data.is_some()).count() == 3).await;
    let relay_messages_before = session.channel.sent_count();

    session.handle.mute_audio().await;

    for name in peers {
        let transport = session.factory.transport_for(&PeerId::from(name));
        wait_until(move || {
            transport.count(|c| c == &TransportCall::SendControl("muteaudio".to_owned())) == 1
        })
        .await;
    }

    settle().await;
    assert_eq!(
        session.channel.sent_count(),
        relay_messages_before,
        "mute must not produce relay traffic"
    );
}

#[tokio::test]
async fn unmute_follows_the_same_path() {
    let mut session = create_test_session().await;
    let bob = PeerId::from("bob");

    session.channel.deliver(Message::offer_request(bob.clone())).await;
    let _connect = next_session_event(&mut session.events).await;

    session.handle.mute_audio().await;
    session.handle.unmute_audio().await;

    let transport = session.factory.transport_for(&bob);
    wait_until(move || {
        transport.count(|c| c == &TransportCall::SendControl("unmuteaudio".to_owned())) == 1
    })
    .await;
}
