use crate::integration::{camera_stream, create_test_engine, screen_stream};
use crate::utils::{TransportCall, settle, wait_until};
use huddle_client::engine::EngineCommand;

#[tokio::test]
async fn add_stream_is_idempotent_per_track_and_stream() {
    let engine = create_test_engine("bob", false);
    let stream = camera_stream();

    engine
        .handle
        .send(EngineCommand::AddStream(stream.clone()))
        .await;
    engine
        .handle
        .send(EngineCommand::AddStream(stream.clone()))
        .await;

    let transport = engine.transport.clone();
    wait_until(move || transport.count(|c| matches!(c, TransportCall::AddTrack { .. })) == 2).await;
    settle().await;
    assert_eq!(
        engine
            .transport
            .count(|c| matches!(c, TransportCall::AddTrack { .. })),
        2,
        "re-adding the same stream must not create more senders"
    );
}

#[tokio::test]
async fn detach_then_reattach_is_safe() {
    let engine = create_test_engine("bob", false);
    let stream = camera_stream();

    engine
        .handle
        .send(EngineCommand::AddStream(stream.clone()))
        .await;
    engine
        .handle
        .send(EngineCommand::RemoveStream(stream.clone()))
        .await;
    engine.handle.send(EngineCommand::AddStream(stream)).await;

    let transport = engine.transport.clone();
    wait_until(move || {
        transport.count(|c| matches!(c, TransportCall::AddTrack { .. })) == 4
            && transport.count(|c| matches!(c, TransportCall::RemoveTrack(_))) == 2
    })
    .await;
}

#[tokio::test]
async fn removing_an_unattached_stream_is_a_noop() {
    let engine = create_test_engine("bob", false);

    engine
        .handle
        .send(EngineCommand::RemoveStream(screen_stream()))
        .await;

    settle().await;
    assert_eq!(
        engine
            .transport
            .count(|c| matches!(c, TransportCall::RemoveTrack(_))),
        0
    );
}
