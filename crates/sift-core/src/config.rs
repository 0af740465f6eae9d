use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl ProjectConfig {
    /// Reject values the ranking math cannot work with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first out-of-range key.
    pub fn validate(&self) -> Result<()> {
        self.fusion.validate()?;
        self.evaluation.validate()
    }
}

/// How the semantic side's weight is chosen when both sides have candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightStrategy {
    /// Compare top-N z-scores of each side against its own bulk.
    #[default]
    StandOut,
    /// Logistic curve over the query's token count.
    QueryLength,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// RRF damping constant for variant fusion.
    #[serde(default = "default_rrf_k")]
    pub rrf_k: usize,
    #[serde(default)]
    pub weight_strategy: WeightStrategy,
    /// Entries per side averaged for stand-out detection.
    #[serde(default = "default_standout_top_n")]
    pub standout_top_n: usize,
    /// Minimum mean top-N z-score for a side to stand out.
    #[serde(default = "default_standout_z_threshold")]
    pub standout_z_threshold: f64,
    /// Both sides need strictly more candidates than this before stand-out
    /// detection runs.
    #[serde(default = "default_standout_min_candidates")]
    pub standout_min_candidates: usize,
    #[serde(default = "default_weight_step")]
    pub weight_step: f64,
    #[serde(default = "default_min_semantic_weight")]
    pub min_semantic_weight: f64,
    #[serde(default = "default_max_semantic_weight")]
    pub max_semantic_weight: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            rrf_k: default_rrf_k(),
            weight_strategy: WeightStrategy::default(),
            standout_top_n: default_standout_top_n(),
            standout_z_threshold: default_standout_z_threshold(),
            standout_min_candidates: default_standout_min_candidates(),
            weight_step: default_weight_step(),
            min_semantic_weight: default_min_semantic_weight(),
            max_semantic_weight: default_max_semantic_weight(),
        }
    }
}

impl FusionConfig {
    /// The semantic weight band must satisfy `0 <= min <= max <= 1`, and the
    /// stand-out step and threshold must be finite.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending `fusion.*` key.
    pub fn validate(&self) -> Result<()> {
        let (min, max) = (self.min_semantic_weight, self.max_semantic_weight);
        ensure!(
            (0.0..=1.0).contains(&min) && (0.0..=1.0).contains(&max) && min <= max,
            "fusion.min_semantic_weight ({min}) and fusion.max_semantic_weight ({max}) \
             must satisfy 0 <= min <= max <= 1"
        );
        ensure!(
            self.weight_step.is_finite(),
            "fusion.weight_step must be finite, got {}",
            self.weight_step
        );
        ensure!(
            self.standout_z_threshold.is_finite(),
            "fusion.standout_z_threshold must be finite, got {}",
            self.standout_z_threshold
        );
        Ok(())
    }
}

/// One `k` cutoff of the weighted top-k consistency metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyCutoff {
    pub k: usize,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Rank decay for Kendall's W and pairwise MSE weights: `exp(-rank / decay_rate)`.
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,
    /// Empirical ceiling the weighted MSE is divided by before clamping.
    #[serde(default = "default_mse_ceiling")]
    pub mse_ceiling: f64,
    #[serde(default = "default_consistency_cutoffs")]
    pub consistency_cutoffs: Vec<ConsistencyCutoff>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            decay_rate: default_decay_rate(),
            mse_ceiling: default_mse_ceiling(),
            consistency_cutoffs: default_consistency_cutoffs(),
        }
    }
}

impl EvaluationConfig {
    /// `decay_rate` and `mse_ceiling` divide the metrics and must be positive
    /// and finite; cutoff weights must be finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending `evaluation.*` key.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            is_positive_finite(self.decay_rate),
            "evaluation.decay_rate must be a positive finite number, got {}",
            self.decay_rate
        );
        ensure!(
            is_positive_finite(self.mse_ceiling),
            "evaluation.mse_ceiling must be a positive finite number, got {}",
            self.mse_ceiling
        );
        for cutoff in &self.consistency_cutoffs {
            ensure!(
                cutoff.weight.is_finite() && cutoff.weight >= 0.0,
                "evaluation.consistency_cutoffs weight for k = {} must be finite and \
                 non-negative, got {}",
                cutoff.k,
                cutoff.weight
            );
        }
        Ok(())
    }
}

/// `true` for finite values strictly above zero.
#[must_use]
pub const fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Which retrieval sides a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Hybrid,
    Semantic,
    Keyword,
}

impl SearchMode {
    #[must_use]
    pub const fn uses_semantic(self) -> bool {
        matches!(self, Self::Hybrid | Self::Semantic)
    }

    #[must_use]
    pub const fn uses_keyword(self) -> bool {
        matches!(self, Self::Hybrid | Self::Keyword)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Paraphrase variants requested per query.
    #[serde(default = "default_variant_count")]
    pub variant_count: usize,
    /// Keep the user's own wording as one of the variants.
    #[serde(default = "default_true")]
    pub include_original: bool,
    #[serde(default)]
    pub mode: SearchMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            variant_count: default_variant_count(),
            include_original: default_true(),
            mode: SearchMode::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".sift/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid value in {}", path.display()))?;
    Ok(config)
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("sift/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(
        cli_json,
        user.output.clone(),
        env_format,
        std::io::stdout().is_terminal(),
    );

    tracing::debug!(output = %resolved_output, "resolved sift configuration");

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn resolve_output(
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
    is_tty: bool,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    let mode = if is_tty { "pretty" } else { "text" };
    mode.to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_rrf_k() -> usize {
    60
}

const fn default_standout_top_n() -> usize {
    10
}

const fn default_standout_z_threshold() -> f64 {
    2.0
}

const fn default_standout_min_candidates() -> usize {
    200
}

const fn default_weight_step() -> f64 {
    0.25
}

const fn default_min_semantic_weight() -> f64 {
    0.2
}

const fn default_max_semantic_weight() -> f64 {
    0.8
}

const fn default_decay_rate() -> f64 {
    20.0
}

const fn default_mse_ceiling() -> f64 {
    0.25
}

fn default_consistency_cutoffs() -> Vec<ConsistencyCutoff> {
    vec![
        ConsistencyCutoff { k: 10, weight: 0.7 },
        ConsistencyCutoff { k: 20, weight: 0.3 },
    ]
}

const fn default_variant_count() -> usize {
    4
}
