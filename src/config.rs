//! Process configuration
//!
//! Every knob is an environment variable with a default. Values that fail to
//! parse are logged and replaced by the default.

use crate::classifier::ClassifierMode;
use crate::followup::DEFAULT_ROUNDS;
use crate::llm::RetryPolicy;
use crate::retrieval::DEFAULT_TOP_K;
use crate::stages::StageOptions;
use crate::workflow::WorkflowKind;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:1234/v1";
const DEFAULT_API_KEY: &str = "not-needed";
const DEFAULT_MODEL: &str = "llama-3.2-1b-instruct";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRIEVAL_TIMEOUT_SECS: u64 = 30;

/// Completion backend settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl LlmSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            attempt_timeout: self.timeout,
            ..RetryPolicy::default()
        }
    }
}

/// Retrieval augmentation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalSettings {
    pub enabled: bool,
    pub top_k: usize,
    /// `None` uses the built-in corpus
    pub knowledge_base: Option<PathBuf>,
    /// `None` uses the lexical retriever
    pub embedding_model: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageConfig {
    pub llm: LlmSettings,
    pub retrieval: RetrievalSettings,
    pub workflow: WorkflowKind,
    pub follow_up_rounds: usize,
    pub analysis_mode: ClassifierMode,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl TriageConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm = LlmSettings {
            base_url: string("TRIAGE_LLM_BASE_URL", DEFAULT_BASE_URL),
            api_key: string("TRIAGE_LLM_API_KEY", DEFAULT_API_KEY),
            model: string("TRIAGE_MODEL", DEFAULT_MODEL),
            max_tokens: optional("TRIAGE_MAX_TOKENS")
                .and_then(|v| parse_or_warn("TRIAGE_MAX_TOKENS", &v)),
            timeout: Duration::from_secs(parsed(
                &lookup,
                "TRIAGE_LLM_TIMEOUT_SECS",
                DEFAULT_LLM_TIMEOUT_SECS,
            )),
            max_attempts: parsed(&lookup, "TRIAGE_LLM_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS).max(1),
        };

        let retrieval = RetrievalSettings {
            enabled: optional("TRIAGE_RETRIEVAL").is_some_and(|v| parse_flag(&v)),
            top_k: parsed(&lookup, "TRIAGE_RETRIEVAL_TOP_K", DEFAULT_TOP_K),
            knowledge_base: optional("TRIAGE_KNOWLEDGE_BASE").map(PathBuf::from),
            embedding_model: optional("TRIAGE_EMBEDDING_MODEL"),
            timeout: Duration::from_secs(parsed(
                &lookup,
                "TRIAGE_RETRIEVAL_TIMEOUT_SECS",
                DEFAULT_RETRIEVAL_TIMEOUT_SECS,
            )),
        };

        let workflow = optional("TRIAGE_WORKFLOW")
            .and_then(|v| {
                let kind = WorkflowKind::from_name(&v);
                if kind.is_none() {
                    tracing::warn!(value = %v, "Unknown TRIAGE_WORKFLOW, using staged");
                }
                kind
            })
            .unwrap_or_default();

        let analysis_mode = optional("TRIAGE_ANALYSIS_CLASSIFIER")
            .and_then(|v| {
                let mode = ClassifierMode::from_name(&v);
                if mode.is_none() {
                    tracing::warn!(value = %v, "Unknown TRIAGE_ANALYSIS_CLASSIFIER, using exact");
                }
                mode
            })
            .unwrap_or(ClassifierMode::ExactFeeling);

        Self {
            llm,
            retrieval,
            workflow,
            follow_up_rounds: parsed(&lookup, "TRIAGE_FOLLOW_UP_ROUNDS", DEFAULT_ROUNDS),
            analysis_mode,
        }
    }

    pub fn stage_options(&self) -> StageOptions {
        StageOptions {
            analysis_mode: self.analysis_mode,
            follow_up_rounds: self.follow_up_rounds,
            top_k: self.retrieval.top_k,
            max_tokens: self.llm.max_tokens,
        }
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| parse_or_warn(key, &v))
        .unwrap_or(default)
}

fn parse_or_warn<T: FromStr>(key: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(key, value, "Ignoring unparsable configuration value");
    }
    parsed
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> TriageConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        TriageConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = TriageConfig::default();
        assert_eq!(c.llm.base_url, "http://localhost:1234/v1");
        assert_eq!(c.llm.model, "llama-3.2-1b-instruct");
        assert_eq!(c.llm.max_tokens, None);
        assert_eq!(c.llm.timeout, Duration::from_secs(120));
        assert_eq!(c.llm.max_attempts, 3);
        assert!(!c.retrieval.enabled);
        assert_eq!(c.retrieval.top_k, 3);
        assert_eq!(c.retrieval.timeout, Duration::from_secs(30));
        assert_eq!(c.workflow, WorkflowKind::Staged);
        assert_eq!(c.follow_up_rounds, 2);
        assert_eq!(c.analysis_mode, ClassifierMode::ExactFeeling);
    }

    #[test]
    fn test_overrides() {
        let c = config(&[
            ("TRIAGE_MODEL", "deepseek-r1"),
            ("TRIAGE_MAX_TOKENS", "512"),
            ("TRIAGE_RETRIEVAL", "true"),
            ("TRIAGE_RETRIEVAL_TOP_K", "5"),
            ("TRIAGE_KNOWLEDGE_BASE", "/tmp/kb.txt"),
            ("TRIAGE_EMBEDDING_MODEL", "nomic-embed-text"),
            ("TRIAGE_WORKFLOW", "check_in"),
            ("TRIAGE_ANALYSIS_CLASSIFIER", "lexical"),
            ("TRIAGE_FOLLOW_UP_ROUNDS", "0"),
        ]);
        assert_eq!(c.llm.model, "deepseek-r1");
        assert_eq!(c.llm.max_tokens, Some(512));
        assert!(c.retrieval.enabled);
        assert_eq!(c.retrieval.top_k, 5);
        assert_eq!(c.retrieval.knowledge_base, Some(PathBuf::from("/tmp/kb.txt")));
        assert_eq!(c.retrieval.embedding_model.as_deref(), Some("nomic-embed-text"));
        assert_eq!(c.workflow, WorkflowKind::CheckIn);
        assert_eq!(c.analysis_mode, ClassifierMode::Lexical);
        assert_eq!(c.follow_up_rounds, 0);
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let c = config(&[
            ("TRIAGE_LLM_TIMEOUT_SECS", "soon"),
            ("TRIAGE_MAX_TOKENS", "-1"),
            ("TRIAGE_WORKFLOW", "freeform"),
            ("TRIAGE_RETRIEVAL", "maybe"),
            ("TRIAGE_LLM_MAX_ATTEMPTS", "0"),
            ("TRIAGE_MODEL", "  "),
        ]);
        assert_eq!(c.llm.timeout, Duration::from_secs(120));
        assert_eq!(c.llm.max_tokens, None);
        assert_eq!(c.workflow, WorkflowKind::Staged);
        assert!(!c.retrieval.enabled);
        assert_eq!(c.llm.max_attempts, 1);
        assert_eq!(c.llm.model, "llama-3.2-1b-instruct");
    }

    #[test]
    fn test_stage_options_and_retry_policy() {
        let c = config(&[("TRIAGE_LLM_TIMEOUT_SECS", "10"), ("TRIAGE_MAX_TOKENS", "64")]);
        let options = c.stage_options();
        assert_eq!(options.max_tokens, Some(64));
        assert_eq!(options.top_k, 3);

        let policy = c.llm.retry_policy();
        assert_eq!(policy.attempt_timeout, Duration::from_secs(10));
        assert_eq!(policy.base_delay, Duration::from_secs(1));
    }
}
