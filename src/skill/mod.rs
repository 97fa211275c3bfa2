//! The generic-response skill: a supportability condition and a response
//! generator, exposed to the dialog engine as a transition condition and a
//! response handler. Both hooks degrade instead of propagating failures: the
//! condition to `true`, the generator to an empty reply.

pub mod synthesis;

use std::sync::Arc;

use async_trait::async_trait;
use itertools::Itertools;
use rand::seq::SliceRandom;
use regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::{debug, info};

use crate::classifier::{self, ClassifierError, SpeechFunctionClient};
use crate::dialog::{Context, ResponseHandler, TransitionCondition};
use crate::nlp;
use crate::phrasebook::Vocabulary;
use crate::telemetry::Telemetry;

pub const SKILL_NAME: &str = "generic_responses";

/// An utterance this long (in tokens) is handled even when the previous bot
/// turn came from another skill.
const LONG_UTTERANCE_TOKENS: usize = 10;

#[derive(Debug, Error)]
pub enum SkillError {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error("conversation has no human utterance yet")]
    EmptyConversation,
}

/// What the response hook decided, before the engine adapter collapses it to
/// text. `Deferred` means other skills should answer this turn; a failure is
/// carried in the `Err` side of the hook result.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Deferred,
}

pub struct GenericResponses {
    client: SpeechFunctionClient,
    telemetry: Telemetry,
    vocabulary: Vocabulary,
    supported: Regex,
    repeat_register: bool,
}

impl GenericResponses {
    pub fn new(
        client: SpeechFunctionClient,
        telemetry: Telemetry,
        vocabulary: Vocabulary,
        repeat_register: bool,
    ) -> anyhow::Result<Self> {
        let pattern = format!("({})", vocabulary.supported_labels.iter().join("|"));
        let supported = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()?;

        Ok(Self {
            client,
            telemetry,
            vocabulary,
            supported,
            repeat_register,
        })
    }

    /// The first proposed speech function on the latest turn whose label this
    /// skill can answer.
    fn supported_prediction(&self, ctx: &Context) -> Result<Option<String>, SkillError> {
        let recorded = classifier::recorded_speech_functions(ctx)?;
        debug!(?recorded, "recorded speech functions");

        if let Some(predictions) = classifier::last_predictions(ctx)? {
            for prediction in &predictions {
                debug!(prediction = %prediction.prediction, "proposed speech function");
                if self.supported.is_match(&prediction.prediction) {
                    return Ok(Some(prediction.prediction.clone()));
                }
            }
        }
        Ok(None)
    }

    /// The supportability check. The lookup result is logged; the check
    /// itself stays permissive either way.
    fn check_supported(&self, ctx: &Context) -> Result<bool, SkillError> {
        match self.supported_prediction(ctx)? {
            Some(prediction) => info!(
                %prediction,
                "proposed speech function is supported for a generic response"
            ),
            None => info!("no supported speech function proposed"),
        }
        Ok(true)
    }

    fn last_turn_was_ours(&self, ctx: &Context) -> bool {
        ctx.last_response()
            .is_some_and(|turn| turn.active_skill == SKILL_NAME)
    }

    async fn produce(&self, ctx: &mut Context) -> Result<Reply, SkillError> {
        let utterance = ctx
            .last_request()
            .map(str::to_string)
            .ok_or(SkillError::EmptyConversation)?;

        let tokens = nlp::words(&utterance);
        if !(self.last_turn_was_ours(ctx) || tokens.len() > LONG_UTTERANCE_TOKENS) {
            return Ok(Reply::Deferred);
        }

        let phrases = nlp::sentences(&utterance);
        let has_question = phrases.iter().any(|phrase| phrase.contains('?'));
        let interrogative_opener = tokens
            .first()
            .is_some_and(|word| self.vocabulary.interrogatives.contains(&word.to_lowercase()));

        let mut labels = Vec::new();
        if !has_question || !interrogative_opener {
            let predictions = self.client.annotate(ctx).await?;
            labels = predictions
                .into_iter()
                .map(|prediction| prediction.prediction)
                .collect::<Vec<_>>();
            info!(labels = %labels.iter().join(", "), "speech functions for the utterance");
        }
        if labels.is_empty() {
            return Ok(Reply::Deferred);
        }

        let Some(predictions) = classifier::last_predictions(ctx)? else {
            return Ok(Reply::Deferred);
        };

        let mut candidates = Vec::new();
        for prediction in &predictions {
            let candidate = synthesis::generate_response(
                ctx,
                &prediction.prediction,
                &utterance,
                &self.vocabulary,
                self.repeat_register,
            );
            if let Some(candidate) = candidate {
                if candidate != "??" && candidate != ".?" {
                    candidates.push(candidate);
                }
            }
        }

        let response = if candidates.is_empty() {
            self.vocabulary
                .greetings
                .choose(&mut rand::thread_rng())
                .cloned()
                .unwrap_or_default()
        } else {
            candidates
                .choose(&mut rand::thread_rng())
                .cloned()
                .unwrap_or_default()
        };
        Ok(Reply::Text(response))
    }
}

/// Transition condition wrapping the supportability check. Errors are logged,
/// reported to telemetry and degraded to `true`.
pub struct GenericCondition {
    skill: Arc<GenericResponses>,
}

impl GenericCondition {
    pub fn new(skill: &Arc<GenericResponses>) -> Self {
        Self {
            skill: Arc::clone(skill),
        }
    }
}

impl TransitionCondition for GenericCondition {
    fn accepts(&self, ctx: &Context) -> bool {
        match self.skill.check_supported(ctx) {
            Ok(flag) => {
                debug!(flag, "generic response condition");
                flag
            }
            Err(error) => {
                self.skill.telemetry.capture(&error);
                true
            }
        }
    }
}

#[async_trait]
impl ResponseHandler for GenericResponses {
    fn skill_name(&self) -> &str {
        SKILL_NAME
    }

    async fn respond(&self, ctx: &mut Context) -> String {
        match self.produce(ctx).await {
            Ok(Reply::Text(text)) => {
                info!(%text, "generic response");
                text
            }
            Ok(Reply::Deferred) => {
                debug!("generic response deferred to other skills");
                String::new()
            }
            Err(error) => {
                self.telemetry.capture(&error);
                String::new()
            }
        }
    }
}
