use speech_function_chatbot::dialog::Context;
use speech_function_chatbot::flows::{self, GREETING_DIALOG};
use speech_function_chatbot::telemetry::Telemetry;

#[tokio::test]
async fn walks_the_scripted_greeting_dialog() -> anyhow::Result<()> {
    let actor = flows::greeting_script()?;
    let telemetry = Telemetry::disabled();
    let mut ctx = Context::new("greeting-walk");

    for &(request, expected) in GREETING_DIALOG {
        let response = flows::run_turn(&actor, &mut ctx, None, &telemetry, request).await;
        assert_eq!(response, expected, "request {request:?}");
    }

    Ok(())
}

#[tokio::test]
async fn self_test_covers_the_same_walk() -> anyhow::Result<()> {
    let actor = flows::greeting_script()?;
    flows::self_test(&actor, &Telemetry::disabled()).await
}

#[tokio::test]
async fn off_script_input_reaches_the_fallback_node() -> anyhow::Result<()> {
    let actor = flows::greeting_script()?;
    let telemetry = Telemetry::disabled();
    let mut ctx = Context::new("fallback-walk");

    let response = flows::run_turn(&actor, &mut ctx, None, &telemetry, "open the pod bay doors").await;
    assert_eq!(response, "Ooops");

    // The fallback node recovers on a greeting.
    let response = flows::run_turn(&actor, &mut ctx, None, &telemetry, "Hi").await;
    assert_eq!(response, "Hi, how are you?");
    Ok(())
}
