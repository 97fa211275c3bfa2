//! A minimal turn-based dialog engine: named nodes, condition-guarded
//! transitions, a fallback node for unmatched input.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier;

/// One bot turn, together with the skill that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotTurn {
    pub text: String,
    pub active_skill: String,
}

/// The accumulated state of one conversation. Skills read the request and
/// response histories and append derived annotations to `misc`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    pub id: String,
    pub requests: Vec<String>,
    pub responses: Vec<BotTurn>,
    pub current_node: Option<String>,
    pub misc: HashMap<String, serde_json::Value>,
}

impl Context {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn add_request(&mut self, text: impl Into<String>) {
        self.requests.push(text.into());
    }

    pub fn add_response(&mut self, text: impl Into<String>, active_skill: impl Into<String>) {
        self.responses.push(BotTurn {
            text: text.into(),
            active_skill: active_skill.into(),
        });
    }

    pub fn last_request(&self) -> Option<&str> {
        self.requests.last().map(String::as_str)
    }

    pub fn last_response(&self) -> Option<&BotTurn> {
        self.responses.last()
    }
}

/// Decides whether a transition fires for the current context.
pub trait TransitionCondition: Send + Sync {
    fn accepts(&self, ctx: &Context) -> bool;
}

/// Fires when the latest request equals the given text.
pub struct ExactMatch(String);

impl ExactMatch {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl TransitionCondition for ExactMatch {
    fn accepts(&self, ctx: &Context) -> bool {
        ctx.last_request() == Some(self.0.as_str())
    }
}

/// Fires when the latest recorded speech function contains the given label.
pub struct SpeechFunction(String);

impl SpeechFunction {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }
}

impl TransitionCondition for SpeechFunction {
    fn accepts(&self, ctx: &Context) -> bool {
        matches!(
            classifier::last_speech_function(ctx),
            Ok(Some(label)) if label.contains(self.0.as_str())
        )
    }
}

/// Produces the text of a node whose response is computed per turn.
#[async_trait]
pub trait ResponseHandler: Send + Sync {
    fn skill_name(&self) -> &str;

    async fn respond(&self, ctx: &mut Context) -> String;
}

pub enum NodeResponse {
    Text(String),
    Handler(Arc<dyn ResponseHandler>),
}

pub enum Transition {
    To(String),
    Repeat,
}

pub type GuardedTransition = (Transition, Box<dyn TransitionCondition>);

pub struct Node {
    response: NodeResponse,
    transitions: Vec<GuardedTransition>,
}

impl Node {
    pub fn text(text: impl Into<String>, transitions: Vec<GuardedTransition>) -> Self {
        Self {
            response: NodeResponse::Text(text.into()),
            transitions,
        }
    }

    pub fn handler(handler: Arc<dyn ResponseHandler>, transitions: Vec<GuardedTransition>) -> Self {
        Self {
            response: NodeResponse::Handler(handler),
            transitions,
        }
    }
}

/// A dialog script: a set of named nodes with a start and a fallback label.
pub struct Script {
    skill_name: String,
    start: String,
    fallback: String,
    nodes: HashMap<String, Node>,
}

impl Script {
    pub fn new(
        skill_name: impl Into<String>,
        start: impl Into<String>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            skill_name: skill_name.into(),
            start: start.into(),
            fallback: fallback.into(),
            nodes: HashMap::new(),
        }
    }

    pub fn node(mut self, name: impl Into<String>, node: Node) -> Self {
        self.nodes.insert(name.into(), node);
        self
    }
}

/// Walks a script one request at a time.
pub struct Actor {
    script: Script,
}

impl Actor {
    pub fn new(script: Script) -> Result<Self> {
        anyhow::ensure!(
            script.nodes.contains_key(&script.start),
            "start node {:?} is not part of the script",
            script.start
        );
        anyhow::ensure!(
            script.nodes.contains_key(&script.fallback),
            "fallback node {:?} is not part of the script",
            script.fallback
        );
        for (name, node) in &script.nodes {
            for (transition, _) in &node.transitions {
                if let Transition::To(target) = transition {
                    anyhow::ensure!(
                        script.nodes.contains_key(target),
                        "node {name:?} transitions to unknown node {target:?}"
                    );
                }
            }
        }
        Ok(Self { script })
    }

    /// Process the latest request already appended to the context: evaluate
    /// the current node's transitions in declared order, fall back when none
    /// match, emit the target node's response and record the bot turn.
    pub async fn turn(&self, ctx: &mut Context) -> String {
        let current = ctx
            .current_node
            .clone()
            .unwrap_or_else(|| self.script.start.clone());

        let mut next = self.script.fallback.clone();
        if let Some(node) = self.script.nodes.get(&current) {
            for (transition, condition) in &node.transitions {
                if condition.accepts(ctx) {
                    next = match transition {
                        Transition::To(target) => target.clone(),
                        Transition::Repeat => current.clone(),
                    };
                    break;
                }
            }
        }
        if !self.script.nodes.contains_key(&next) {
            next = self.script.fallback.clone();
        }
        debug!(from = %current, to = %next, "dialog transition");

        let Some(node) = self.script.nodes.get(&next) else {
            return String::new();
        };
        let (text, skill) = match &node.response {
            NodeResponse::Text(text) => (text.clone(), self.script.skill_name.clone()),
            NodeResponse::Handler(handler) => {
                (handler.respond(ctx).await, handler.skill_name().to_string())
            }
        };

        ctx.add_response(text.clone(), skill);
        ctx.current_node = Some(next);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_script() -> Script {
        Script::new("test_script", "start", "fallback")
            .node(
                "start",
                Node::text(
                    "",
                    vec![(
                        Transition::To("greet".to_string()),
                        Box::new(ExactMatch::new("Hi")),
                    )],
                ),
            )
            .node(
                "greet",
                Node::text(
                    "Hello!",
                    vec![(Transition::Repeat, Box::new(ExactMatch::new("Hi")))],
                ),
            )
            .node("fallback", Node::text("Ooops", vec![]))
    }

    #[tokio::test]
    async fn follows_matching_transitions() {
        let actor = Actor::new(two_node_script()).expect("script is valid");
        let mut ctx = Context::new("test");

        ctx.add_request("Hi");
        assert_eq!(actor.turn(&mut ctx).await, "Hello!");
        assert_eq!(ctx.current_node.as_deref(), Some("greet"));
        assert_eq!(ctx.last_response().map(|t| t.active_skill.as_str()), Some("test_script"));
    }

    #[tokio::test]
    async fn repeats_the_current_node() {
        let actor = Actor::new(two_node_script()).expect("script is valid");
        let mut ctx = Context::new("test");

        ctx.add_request("Hi");
        actor.turn(&mut ctx).await;
        ctx.add_request("Hi");
        assert_eq!(actor.turn(&mut ctx).await, "Hello!");
        assert_eq!(ctx.current_node.as_deref(), Some("greet"));
    }

    #[tokio::test]
    async fn routes_unmatched_input_to_the_fallback_node() {
        let actor = Actor::new(two_node_script()).expect("script is valid");
        let mut ctx = Context::new("test");

        ctx.add_request("something else");
        assert_eq!(actor.turn(&mut ctx).await, "Ooops");
        assert_eq!(ctx.current_node.as_deref(), Some("fallback"));
    }

    #[test]
    fn rejects_scripts_with_dangling_transitions() {
        let script = Script::new("test_script", "start", "start").node(
            "start",
            Node::text(
                "",
                vec![(
                    Transition::To("missing".to_string()),
                    Box::new(ExactMatch::new("Hi")),
                )],
            ),
        );
        assert!(Actor::new(script).is_err());
    }
}
