use crate::core::codec::QueryStringCodec;
use crate::core::controller::{
    ControllerSettings, DEFAULT_ARTIFACT_CLEANUP_DELAY, DEFAULT_INTER_ELEMENT_DELAY,
};
use crate::domain::model::{ElementKind, TargetElement};
use crate::utils::error::{RepostError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern compiles"));

const MAX_DELAY_MS: u64 = 60_000;

/// A host document described in TOML: controller settings plus its frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub frames: Vec<FrameConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub suppress_initial_navigation: Option<bool>,
    pub artifact_cleanup_delay_ms: Option<u64>,
    pub inter_element_delay_ms: Option<u64>,
    /// Location of the host document; scheme-less frame sources inherit its scheme.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameConfig {
    pub id: String,
    /// Defaults to `id` when omitted.
    pub name: Option<String>,
    pub src: String,
    /// Element node name, `iframe` when omitted.
    pub kind: Option<String>,
}

impl FrameConfig {
    pub fn to_element(&self) -> TargetElement {
        let name = self.name.clone().unwrap_or_else(|| self.id.clone());
        let kind = self
            .kind
            .as_deref()
            .map(ElementKind::from_node_name)
            .unwrap_or_default();
        TargetElement::new(self.id.clone(), name, self.src.clone()).with_kind(kind)
    }
}

impl DocumentConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed)?)
    }

    /// 替換環境變數 (例如 ${PORTAL_HOST})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_PLACEHOLDER
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn suppress_initial_navigation(&self) -> bool {
        self.controller.suppress_initial_navigation.unwrap_or(false)
    }

    pub fn artifact_cleanup_delay(&self) -> Duration {
        self.controller
            .artifact_cleanup_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_ARTIFACT_CLEANUP_DELAY)
    }

    pub fn inter_element_delay(&self) -> Duration {
        self.controller
            .inter_element_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_INTER_ELEMENT_DELAY)
    }

    pub fn controller_settings(&self) -> Result<ControllerSettings> {
        let codec = match &self.controller.base_url {
            Some(base) => {
                let base = Url::parse(base).map_err(|e| RepostError::InvalidConfigValueError {
                    field: "controller.base_url".to_string(),
                    value: base.clone(),
                    reason: e.to_string(),
                })?;
                QueryStringCodec::with_base(base)
            }
            None => QueryStringCodec::new(),
        };

        Ok(ControllerSettings {
            suppress_initial_navigation: self.suppress_initial_navigation(),
            artifact_cleanup_delay: self.artifact_cleanup_delay(),
            codec,
        })
    }

    pub fn elements(&self) -> Vec<TargetElement> {
        self.frames.iter().map(FrameConfig::to_element).collect()
    }
}

impl Validate for DocumentConfig {
    /// Checks the document shape only; per-frame identity rules are enforced
    /// when a frame is actually posted.
    fn validate(&self) -> Result<()> {
        if let Some(base) = &self.controller.base_url {
            validation::validate_url("controller.base_url", base)?;
        }
        if let Some(ms) = self.controller.artifact_cleanup_delay_ms {
            validation::validate_range("controller.artifact_cleanup_delay_ms", ms, 0, MAX_DELAY_MS)?;
        }
        if let Some(ms) = self.controller.inter_element_delay_ms {
            validation::validate_range("controller.inter_element_delay_ms", ms, 0, MAX_DELAY_MS)?;
        }

        if self.frames.is_empty() {
            return Err(RepostError::MissingConfigError {
                field: "frames".to_string(),
            });
        }
        for frame in &self.frames {
            validation::validate_non_empty_string("frames.src", &frame.src)?;
        }
        validation::validate_unique("frames.id", self.frames.iter().map(|f| f.id.as_str()))?;

        Ok(())
    }
}
