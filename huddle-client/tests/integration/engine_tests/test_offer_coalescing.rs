use crate::integration::{answer_blob, create_test_engine, sdp_payload};
use crate::utils::{TransportCall, next_message, settle};
use huddle_client::engine::EngineCommand;
use huddle_client::transport::TransportEvent;
use huddle_core::model::SignalPayload;

#[tokio::test]
async fn triggers_while_negotiating_produce_no_second_offer() {
    let mut engine = create_test_engine("bob", false);

    engine
        .transport
        .push_event(TransportEvent::NegotiationNeeded)
        .await;
    let _offer = next_message(&mut engine.outbound).await;

    // Both trigger paths coalesce while the round trip is outstanding.
    engine
        .transport
        .push_event(TransportEvent::NegotiationNeeded)
        .await;
    engine.handle.send(EngineCommand::Negotiation(None)).await;

    settle().await;
    assert!(engine.outbound.try_recv().is_err());
    assert_eq!(
        engine
            .transport
            .count(|c| matches!(c, TransportCall::CreateOffer)),
        1
    );

    // The answer completes the round; the next trigger offers again.
    engine
        .handle
        .send(EngineCommand::Negotiation(sdp_payload(answer_blob())))
        .await;
    engine
        .transport
        .push_event(TransportEvent::NegotiationNeeded)
        .await;

    let second = next_message(&mut engine.outbound).await;
    assert!(matches!(second.data, Some(SignalPayload::Sdp { .. })));
    assert_eq!(
        engine
            .transport
            .count(|c| matches!(c, TransportCall::CreateOffer)),
        2
    );
}

#[tokio::test]
async fn stable_signaling_state_resets_the_guard() {
    let mut engine = create_test_engine("bob", false);

    engine
        .transport
        .push_event(TransportEvent::NegotiationNeeded)
        .await;
    let _offer = next_message(&mut engine.outbound).await;

    // The transport settling (e.g. a rolled-back round) releases the
    // single-flight guard even without an answer.
    engine
        .transport
        .push_event(TransportEvent::SignalingStable)
        .await;
    engine
        .transport
        .push_event(TransportEvent::NegotiationNeeded)
        .await;

    let _second = next_message(&mut engine.outbound).await;
    assert_eq!(
        engine
            .transport
            .count(|c| matches!(c, TransportCall::CreateOffer)),
        2
    );
}
