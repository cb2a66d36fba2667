// src/state.rs

use axum::extract::FromRef;

use crate::{
    config::Config,
    generation::DynTextGenerator,
    scoring::ScoringPolicy,
    speech::{DynSynthesizer, DynTranscriber},
    store::DynStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub config: Config,
    pub policy: &'static ScoringPolicy,
    pub transcriber: DynTranscriber,
    pub synthesizer: DynSynthesizer,
    pub generator: DynTextGenerator,
}

impl AppState {
    pub fn new(
        store: DynStore,
        config: Config,
        transcriber: DynTranscriber,
        synthesizer: DynSynthesizer,
        generator: DynTextGenerator,
    ) -> Self {
        Self {
            store,
            config,
            policy: ScoringPolicy::current(),
            transcriber,
            synthesizer,
            generator,
        }
    }
}

impl FromRef<AppState> for DynStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
