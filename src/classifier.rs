//! Client for the remote speech-function classifier, plus the typed accessors
//! for the predictions it accumulates on the conversation context.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::dialog::Context;
use crate::nlp;

/// Side-channel key holding one prediction list per classified turn.
pub const PREDICTIONS_KEY: &str = "speech_function_predictions";
/// Side-channel key holding one label list per classified turn.
pub const SPEECH_FUNCTIONS_KEY: &str = "speech_functions";

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("speech-function request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("recorded speech-function annotations are malformed: {0}")]
    Annotation(#[from] serde_json::Error),

    #[error("side-channel entry {0:?} is not a list")]
    Malformed(&'static str),
}

/// One classifier prediction for an utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: String,
    pub confidence: f64,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    phrase: &'a [String],
    prev_phrase: Option<&'a str>,
    prev_speech_function: Option<&'a str>,
}

pub struct SpeechFunctionClient {
    endpoint: String,
    client: reqwest::Client,
}

impl SpeechFunctionClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Ask the remote classifier for the speech functions of an utterance,
    /// given the bot's previous phrase and the previously recorded label.
    pub async fn classify(
        &self,
        phrases: &[String],
        prev_phrase: Option<&str>,
        prev_speech_function: Option<&str>,
    ) -> Result<Vec<Prediction>, ClassifierError> {
        let request = ClassifyRequest {
            phrase: phrases,
            prev_phrase,
            prev_speech_function,
        };

        let predictions = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(predictions)
    }

    /// Classify the latest human utterance and append the result to the
    /// context's side-channel.
    pub async fn annotate(&self, ctx: &mut Context) -> Result<Vec<Prediction>, ClassifierError> {
        let Some(request) = ctx.last_request().map(str::to_string) else {
            return Ok(Vec::new());
        };

        let phrases = nlp::sentences(&request);
        let prev_phrase = ctx.last_response().map(|turn| turn.text.clone());
        let prev_speech_function = last_speech_function(ctx)?;

        let predictions = self
            .classify(&phrases, prev_phrase.as_deref(), prev_speech_function.as_deref())
            .await?;
        debug!(count = predictions.len(), "classifier predictions received");

        record(ctx, &predictions)?;
        Ok(predictions)
    }
}

/// Append one turn's predictions (and their labels) to the side-channel.
pub fn record(ctx: &mut Context, predictions: &[Prediction]) -> Result<(), ClassifierError> {
    let labels: Vec<&str> = predictions
        .iter()
        .map(|prediction| prediction.prediction.as_str())
        .collect();

    push(ctx, PREDICTIONS_KEY, serde_json::to_value(predictions)?)?;
    push(ctx, SPEECH_FUNCTIONS_KEY, serde_json::to_value(labels)?)?;
    Ok(())
}

fn push(
    ctx: &mut Context,
    key: &'static str,
    value: serde_json::Value,
) -> Result<(), ClassifierError> {
    let entry = ctx
        .misc
        .entry(key.to_string())
        .or_insert_with(|| serde_json::Value::Array(Vec::new()));
    entry
        .as_array_mut()
        .ok_or(ClassifierError::Malformed(key))?
        .push(value);
    Ok(())
}

/// The prediction list recorded for the most recent classified turn.
pub fn last_predictions(ctx: &Context) -> Result<Option<Vec<Prediction>>, ClassifierError> {
    let Some(entry) = ctx.misc.get(PREDICTIONS_KEY) else {
        return Ok(None);
    };
    let turns = entry
        .as_array()
        .ok_or(ClassifierError::Malformed(PREDICTIONS_KEY))?;
    match turns.last() {
        Some(last) => Ok(Some(serde_json::from_value(last.clone())?)),
        None => Ok(None),
    }
}

/// All label lists recorded so far, one per classified turn.
pub fn recorded_speech_functions(ctx: &Context) -> Result<Vec<Vec<String>>, ClassifierError> {
    match ctx.misc.get(SPEECH_FUNCTIONS_KEY) {
        Some(entry) => Ok(serde_json::from_value(entry.clone())?),
        None => Ok(Vec::new()),
    }
}

/// The most recently recorded label, if any turn has been classified.
pub fn last_speech_function(ctx: &Context) -> Result<Option<String>, ClassifierError> {
    let turns = recorded_speech_functions(ctx)?;
    Ok(turns.last().and_then(|labels| labels.last()).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(label: &str, confidence: f64) -> Prediction {
        Prediction {
            prediction: label.to_string(),
            confidence,
        }
    }

    #[test]
    fn records_predictions_per_turn() {
        let mut ctx = Context::new("test");
        record(&mut ctx, &[prediction("Register", 0.7)]).expect("side-channel is writable");
        record(
            &mut ctx,
            &[prediction("Confirm", 0.8), prediction("Clarify", 0.4)],
        )
        .expect("side-channel is writable");

        let last = last_predictions(&ctx)
            .expect("side-channel is readable")
            .expect("a turn was recorded");
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].prediction, "Confirm");

        assert_eq!(
            recorded_speech_functions(&ctx).expect("side-channel is readable"),
            vec![
                vec!["Register".to_string()],
                vec!["Confirm".to_string(), "Clarify".to_string()],
            ]
        );
        assert_eq!(
            last_speech_function(&ctx).expect("side-channel is readable"),
            Some("Clarify".to_string())
        );
    }

    #[test]
    fn reports_malformed_side_channel_entries() {
        let mut ctx = Context::new("test");
        ctx.misc.insert(
            PREDICTIONS_KEY.to_string(),
            serde_json::Value::String("oops".to_string()),
        );
        assert!(last_predictions(&ctx).is_err());
    }

    #[tokio::test]
    async fn posts_the_expected_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/model")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "phrase": ["I bought a guitar."],
                "prev_phrase": "Hi, how are you?",
                "prev_speech_function": null,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"prediction": "Register", "confidence": 0.9}]"#)
            .create_async()
            .await;

        let client = SpeechFunctionClient::new(format!("{}/model", server.url()));
        let predictions = client
            .classify(
                &["I bought a guitar.".to_string()],
                Some("Hi, how are you?"),
                None,
            )
            .await
            .expect("mock classifier responds");

        mock.assert_async().await;
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].prediction, "Register");
    }

    #[tokio::test]
    async fn annotate_records_the_result() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/model")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"prediction": "Confirm", "confidence": 0.8}]"#)
            .create_async()
            .await;

        let client = SpeechFunctionClient::new(format!("{}/model", server.url()));
        let mut ctx = Context::new("test");
        ctx.add_request("I bought a guitar yesterday");

        let predictions = client.annotate(&mut ctx).await.expect("mock classifier responds");
        assert_eq!(predictions.len(), 1);
        assert_eq!(
            last_speech_function(&ctx).expect("side-channel is readable"),
            Some("Confirm".to_string())
        );
    }

    #[tokio::test]
    async fn surfaces_server_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/model")
            .with_status(500)
            .create_async()
            .await;

        let client = SpeechFunctionClient::new(format!("{}/model", server.url()));
        let result = client.classify(&["Hi".to_string()], None, None).await;
        assert!(matches!(result, Err(ClassifierError::Request(_))));
    }
}
