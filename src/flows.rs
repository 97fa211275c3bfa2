//! The two dialog scripts and the per-turn driver that feeds them.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::classifier::SpeechFunctionClient;
use crate::dialog::{Actor, Context, ExactMatch, Node, Script, SpeechFunction, Transition};
use crate::skill::{self, GenericCondition, GenericResponses};
use crate::telemetry::Telemetry;

pub const GREETING_SKILL: &str = "greeting_script";

/// The fixed greeting graph: a linear small-talk walk with a fallback node
/// for anything off-script.
pub fn greeting_script() -> Result<Actor> {
    let script = Script::new(GREETING_SKILL, "start_node", "fallback_node")
        .node(
            "start_node",
            Node::text(
                "",
                vec![
                    (
                        Transition::To("node1".to_string()),
                        Box::new(ExactMatch::new("Hi")),
                    ),
                    (
                        Transition::To("node1".to_string()),
                        Box::new(SpeechFunction::new("Open.Give.Opinion")),
                    ),
                ],
            ),
        )
        .node(
            "node1",
            Node::text(
                "Hi, how are you?",
                vec![(
                    Transition::To("node2".to_string()),
                    Box::new(ExactMatch::new("i'm fine, how are you?")),
                )],
            ),
        )
        .node(
            "node2",
            Node::text(
                "Good. What do you want to talk about?",
                vec![(
                    Transition::To("node3".to_string()),
                    Box::new(ExactMatch::new("Let's talk about music.")),
                )],
            ),
        )
        .node(
            "node3",
            Node::text(
                "Sorry, I can not talk about music now.",
                vec![(
                    Transition::To("node4".to_string()),
                    Box::new(ExactMatch::new("Ok, goodbye.")),
                )],
            ),
        )
        .node(
            "node4",
            Node::text(
                "bye",
                vec![(
                    Transition::To("node1".to_string()),
                    Box::new(ExactMatch::new("Hi")),
                )],
            ),
        )
        .node(
            "fallback_node",
            Node::text(
                "Ooops",
                vec![(
                    Transition::To("node1".to_string()),
                    Box::new(ExactMatch::new("Hi")),
                )],
            ),
        );
    Actor::new(script)
}

/// The generic-response flow: a start node that hands over to the skill when
/// its condition fires, and a response node that repeats for chained fillers.
pub fn generic_script(generic: Arc<GenericResponses>) -> Result<Actor> {
    let script = Script::new(skill::SKILL_NAME, "start_node", "start_node")
        .node(
            "start_node",
            Node::text(
                "",
                vec![(
                    Transition::To("generic_response".to_string()),
                    Box::new(GenericCondition::new(&generic)),
                )],
            ),
        )
        .node(
            "generic_response",
            Node::handler(
                generic.clone(),
                vec![(
                    Transition::Repeat,
                    Box::new(GenericCondition::new(&generic)),
                )],
            ),
        );
    Actor::new(script)
}

/// The greeting script's expected walk, fallback legs included.
pub const GREETING_DIALOG: &[(&str, &str)] = &[
    ("Hi", "Hi, how are you?"),
    ("i'm fine, how are you?", "Good. What do you want to talk about?"),
    ("Let's talk about music.", "Sorry, I can not talk about music now."),
    ("Ok, goodbye.", "bye"),
    ("Hi", "Hi, how are you?"),
    ("stop", "Ooops"),
    ("stop", "Ooops"),
    ("Hi", "Hi, how are you?"),
    ("i'm fine, how are you?", "Good. What do you want to talk about?"),
    ("Let's talk about music.", "Sorry, I can not talk about music now."),
    ("Ok, goodbye.", "bye"),
];

/// Run one turn: append the request, annotate it with the remote classifier
/// when one is configured (failures are logged and reported, never fatal),
/// then step the actor.
pub async fn run_turn(
    actor: &Actor,
    ctx: &mut Context,
    classifier: Option<&SpeechFunctionClient>,
    telemetry: &Telemetry,
    request: &str,
) -> String {
    ctx.add_request(request);

    if let Some(client) = classifier {
        if let Err(error) = client.annotate(ctx).await {
            telemetry.capture(&error);
        }
    }

    let response = actor.turn(ctx).await;
    info!(%request, %response, "turn");
    response
}

/// Walk the greeting script against its expected responses.
pub async fn self_test(actor: &Actor, telemetry: &Telemetry) -> Result<()> {
    let mut ctx = Context::new("self-test");
    for &(request, expected) in GREETING_DIALOG {
        let response = run_turn(actor, &mut ctx, None, telemetry, request).await;
        anyhow::ensure!(
            response == expected,
            "{request:?} -> expected {expected:?}, got {response:?}"
        );
    }
    Ok(())
}
