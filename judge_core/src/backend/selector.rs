use std::collections::HashMap;

use log::{error, warn};

use super::{ExecutionBackend, LocalBackend, RemoteBackend, StubBackend};
use crate::config::JudgeConfig;

pub type BackendFactory = fn(&JudgeConfig) -> Box<dyn ExecutionBackend>;

fn local(config: &JudgeConfig) -> Box<dyn ExecutionBackend> {
    Box::new(LocalBackend::new(&config.local))
}

fn remote(config: &JudgeConfig) -> Box<dyn ExecutionBackend> {
    match RemoteBackend::new(&config.remote) {
        Ok(backend) => Box::new(backend),
        Err(e) => {
            error!("failed to set up the remote backend, using the stub: {}", e.report());
            Box::new(StubBackend)
        }
    }
}

fn stub(_: &JudgeConfig) -> Box<dyn ExecutionBackend> {
    Box::new(StubBackend)
}

/// Maps backend tokens to factories. Unknown tokens get the stub.
pub struct BackendSelector {
    factories: HashMap<String, BackendFactory>,
}

impl Default for BackendSelector {
    fn default() -> Self {
        let mut selector = Self {
            factories: HashMap::new(),
        };
        selector.register("local", local);
        selector.register("remote", remote);
        selector.register("stub", stub);
        selector.register("example", stub);
        selector
    }
}

impl BackendSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, token: &str, factory: BackendFactory) {
        self.factories.insert(token.trim().to_lowercase(), factory);
    }

    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.factories.keys().map(|k| k.as_str()).collect();
        tokens.sort_unstable();
        tokens
    }

    pub fn select(&self, token: &str, config: &JudgeConfig) -> Box<dyn ExecutionBackend> {
        match self.factories.get(&token.trim().to_lowercase()) {
            Some(factory) => factory(config),
            None => {
                warn!("unknown backend `{}`, falling back to the stub", token);
                stub(config)
            }
        }
    }

    /// Picks the backend named by `config.backend`.
    pub fn from_config(&self, config: &JudgeConfig) -> Box<dyn ExecutionBackend> {
        self.select(&config.backend, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tokens() {
        let selector = BackendSelector::new();
        let config = JudgeConfig::default();
        assert_eq!(selector.select("local", &config).name(), "local");
        assert_eq!(selector.select("STUB", &config).name(), "stub");
        assert_eq!(selector.select("example", &config).name(), "stub");
        assert_eq!(selector.tokens(), vec!["example", "local", "remote", "stub"]);
    }

    #[test]
    fn remote_without_catalog() {
        let mut config = JudgeConfig::default();
        config.remote.refresh_languages = false;
        assert_eq!(BackendSelector::new().select("remote", &config).name(), "remote");
    }

    #[test]
    fn unknown_token_is_stub() {
        let config = JudgeConfig::default();
        assert_eq!(BackendSelector::new().select("third_party", &config).name(), "stub");
        assert_eq!(BackendSelector::new().select("", &config).name(), "stub");
    }

    #[test]
    fn custom_factory() {
        fn local_only(config: &JudgeConfig) -> Box<dyn ExecutionBackend> {
            Box::new(LocalBackend::new(&config.local))
        }
        let mut selector = BackendSelector::new();
        selector.register("sandbox", local_only);
        let mut config = JudgeConfig::default();
        config.backend = "Sandbox".into();
        assert_eq!(selector.from_config(&config).name(), "local");
    }
}
