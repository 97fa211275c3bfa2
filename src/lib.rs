pub mod cache;
pub mod classifier;
pub mod dialog;
pub mod flows;
pub mod nlp;
pub mod phrasebook;
pub mod skill;
pub mod telemetry;
