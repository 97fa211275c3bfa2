use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use serde::Deserialize;
use structopt::StructOpt;
use strum::{Display, EnumString};

use speech_function_chatbot::cache::{self, ContextCache, ContextCacheKey};
use speech_function_chatbot::classifier::SpeechFunctionClient;
use speech_function_chatbot::dialog::Context;
use speech_function_chatbot::flows;
use speech_function_chatbot::phrasebook::Vocabulary;
use speech_function_chatbot::skill::GenericResponses;
use speech_function_chatbot::telemetry::Telemetry;

const DEFAULT_CLASSIFIER_URL: &str = "http://localhost:8108/model";

#[derive(Debug, Clone, Copy, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
enum Mode {
    Greeting,
    Generic,
}

#[derive(Deserialize, Debug)]
struct Environment {
    classifier_url: Option<String>,
    telemetry_url: Option<String>,
}

#[derive(StructOpt, Debug)]
#[structopt(
    name = "speech-function-chatbot",
    about = "Scripted dialog walker and generic-response fallback skill"
)]
struct Args {
    /// Dialog flow to run (greeting or generic)
    #[structopt(short, long, default_value = "greeting")]
    mode: Mode,

    /// Path to a vocabulary TOML file overriding the built-in phrase lists
    #[structopt(short = "c", long)]
    config: Option<PathBuf>,

    /// Conversation id; the context is cached on disk under it and resumed
    #[structopt(long)]
    conversation: Option<String>,

    /// Echo the last word of the utterance for Register predictions
    #[structopt(long)]
    repeat_register: bool,

    /// Walk the scripted greeting dialog against its expected responses, then exit
    #[structopt(long)]
    self_test: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let environment = envy::from_env::<Environment>()?;
    let args = Args::from_args();

    let vocabulary: Vocabulary = match &args.config {
        Some(path) => toml::from_str(
            &tokio::fs::read_to_string(path)
                .await
                .context("Failed to read vocabulary file")?,
        )
        .context("Failed to parse vocabulary TOML")?,
        None => Vocabulary::default(),
    };

    let telemetry = Telemetry::new(environment.telemetry_url.clone());
    let classifier_url = environment
        .classifier_url
        .clone()
        .unwrap_or_else(|| DEFAULT_CLASSIFIER_URL.to_string());

    if args.self_test {
        flows::self_test(&flows::greeting_script()?, &telemetry).await?;
        println!("Scripted dialog self-test passed.");
        return Ok(());
    }

    // The greeting walk only consults the classifier when one is explicitly
    // configured; the generic skill always needs it.
    let (actor, classifier) = match args.mode {
        Mode::Greeting => (
            flows::greeting_script()?,
            environment
                .classifier_url
                .as_ref()
                .map(|url| SpeechFunctionClient::new(url.clone())),
        ),
        Mode::Generic => {
            let generic = Arc::new(GenericResponses::new(
                SpeechFunctionClient::new(classifier_url.clone()),
                telemetry.clone(),
                vocabulary.clone(),
                args.repeat_register,
            )?);
            (
                flows::generic_script(generic)?,
                Some(SpeechFunctionClient::new(classifier_url)),
            )
        }
    };

    let cache = ContextCache::new().await?;
    let (key, mut ctx) = match &args.conversation {
        Some(id) => {
            let key = ContextCacheKey {
                conversation_hash: cache::compute_conversation_hash(id),
            };
            let ctx = match cache.get(&key).await {
                Some(ctx) => {
                    println!("Resuming conversation after {} turns.", ctx.requests.len());
                    ctx
                }
                None => Context::new(id.clone()),
            };
            (Some(key), ctx)
        }
        None => (None, Context::new("interactive")),
    };

    let stdin = std::io::stdin();
    loop {
        print!("type your answer: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let request = line.trim();
        if request.is_empty() {
            continue;
        }

        let response =
            flows::run_turn(&actor, &mut ctx, classifier.as_ref(), &telemetry, request).await;
        println!("{response}");

        if let Some(key) = &key {
            cache.insert(key, &ctx).await;
        }
    }

    Ok(())
}
