//! Summary generation: an optional LLM backend with an unconditional
//! deterministic template fallback. The pipeline never fails to produce a
//! summary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use ai_client::OpenAi;
use threatwire_common::{country_display_name, Config, RawAttack, RawVictim};

const SYSTEM_PROMPT: &str = "You are a professional cybersecurity news editor who turns \
technical threat data into concise, readable news summaries.";

/// Character budget for the raw description inside a template summary.
const DESCRIPTION_BUDGET: usize = 100;

/// External text-generation capability. All failure modes — timeout,
/// transport error, non-2xx, empty body — normalize to `None`; the caller
/// falls back to the template variant.
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Option<String>;
}

/// LLM-backed generation via an OpenAI-compatible endpoint.
pub struct LlmBackend {
    agent: OpenAi,
    max_tokens: u32,
    temperature: f32,
}

impl LlmBackend {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        timeout: Duration,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        let agent = OpenAi::new(api_key, model)
            .with_base_url(base_url)
            .with_timeout(timeout);
        Self {
            agent,
            max_tokens,
            temperature,
        }
    }
}

#[async_trait]
impl SummaryBackend for LlmBackend {
    async fn generate(&self, system: &str, prompt: &str) -> Option<String> {
        match self
            .agent
            .complete(system, prompt, self.max_tokens, self.temperature)
            .await
        {
            Ok(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    warn!(model = %self.agent.model(), "LLM returned an empty response");
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Err(e) => {
                warn!(model = %self.agent.model(), error = %e, "LLM generation failed");
                None
            }
        }
    }
}

/// Generates a summary (and optionally a headline) for each accepted record.
/// Tries the configured backend first; falls back to the fixed templates.
pub struct Summarizer {
    backend: Option<Arc<dyn SummaryBackend>>,
    titles_enabled: bool,
    target_countries: Vec<String>,
    target_activity: String,
}

impl Summarizer {
    pub fn new(
        backend: Option<Arc<dyn SummaryBackend>>,
        titles_enabled: bool,
        target_countries: Vec<String>,
        target_activity: String,
    ) -> Self {
        Self {
            backend,
            titles_enabled,
            target_countries,
            target_activity,
        }
    }

    /// Wire up from config: the LLM variant exists only when enabled and
    /// fully configured, otherwise templates alone.
    pub fn from_config(config: &Config) -> Self {
        let backend: Option<Arc<dyn SummaryBackend>> = if config.llm_configured() {
            Some(Arc::new(LlmBackend::new(
                &config.llm_api_key,
                &config.llm_base_url,
                &config.llm_model,
                Duration::from_secs(config.llm_timeout_secs),
                config.llm_max_tokens,
                config.llm_temperature,
            )))
        } else {
            None
        };

        Self::new(
            backend,
            config.llm_title_enabled,
            config.target_countries.clone(),
            config.target_activity.clone(),
        )
    }

    pub async fn victim_summary(&self, v: &RawVictim) -> String {
        if let Some(backend) = &self.backend {
            let prompt = victim_prompt(v);
            if let Some(text) = backend.generate(SYSTEM_PROMPT, &prompt).await {
                debug!(victim = %v.victim, "LLM victim summary generated");
                return text;
            }
            debug!(victim = %v.victim, "LLM summary unavailable, using template");
        }
        victim_template(v, &self.target_countries, &self.target_activity)
    }

    pub async fn attack_summary(&self, a: &RawAttack) -> String {
        if let Some(backend) = &self.backend {
            let prompt = attack_prompt(a);
            if let Some(text) = backend.generate(SYSTEM_PROMPT, &prompt).await {
                debug!(title = %a.title, "LLM attack summary generated");
                return text;
            }
            debug!(title = %a.title, "LLM summary unavailable, using template");
        }
        attack_template(a)
    }

    /// Optional LLM headline. No template fallback: absent backend, disabled
    /// titles, or a failed call all yield `None`.
    pub async fn victim_title(&self, v: &RawVictim) -> Option<String> {
        if !self.titles_enabled {
            return None;
        }
        let backend = self.backend.as_ref()?;
        backend.generate(SYSTEM_PROMPT, &victim_title_prompt(v)).await
    }

    pub async fn attack_title(&self, a: &RawAttack) -> Option<String> {
        if !self.titles_enabled {
            return None;
        }
        let backend = self.backend.as_ref()?;
        backend.generate(SYSTEM_PROMPT, &attack_title_prompt(a)).await
    }
}

/// Deterministic victim summary. Pure and total: every field has a defined
/// default, so this never fails.
pub fn victim_template(v: &RawVictim, target_countries: &[String], target_activity: &str) -> String {
    let company = non_empty(&v.victim, "an unnamed company");
    let discovered = non_empty(&v.discovered, "an unknown date");
    let group_clause = if v.group.is_empty() {
        "an unidentified ransomware group".to_string()
    } else {
        format!("the {} ransomware group", v.group)
    };

    let country_code = v.country.to_uppercase();
    let in_target = target_countries.iter().any(|c| *c == country_code);

    let (industry_desc, risk_desc) = if !target_activity.is_empty()
        && v.activity.contains(target_activity)
    {
        (
            "financial services provider".to_string(),
            "potentially exposing sensitive customer data and financial records",
        )
    } else if !v.activity.is_empty() {
        (
            format!("{} sector business", v.activity),
            "potentially exposing important business data and records",
        )
    } else {
        (
            "business".to_string(),
            "potentially exposing important business data and records",
        )
    };

    let mut summary = if in_target {
        let country_name = country_display_name(&country_code);
        format!("[Ransomware] {country_name} {industry_desc} {company} has been hit by {group_clause}.")
    } else {
        format!("[Ransomware] {industry_desc} {company} has been hit by {group_clause}.")
    };

    summary.push_str(&format!(
        " The attack was discovered on {discovered}, {risk_desc}."
    ));
    summary.push_str(
        " The incident underscores the continuing severity of ransomware threats, \
         and affected organizations should strengthen their defenses.",
    );
    summary
}

/// Deterministic cyberattack summary.
pub fn attack_template(a: &RawAttack) -> String {
    let title = non_empty(&a.title, "Cyberattack incident");

    let date_info = if a.date.is_empty() {
        String::new()
    } else {
        format!("The incident occurred on {}. ", a.date)
    };

    let description_info = if a.description.is_empty() {
        "Details are still under investigation. ".to_string()
    } else {
        let truncated: String = a.description.chars().take(DESCRIPTION_BUDGET).collect();
        format!("According to reports, {truncated}... ")
    };

    format!(
        "[Cyber Incident] {title}. {date_info}{description_info}This incident is another \
         reminder that organizations must keep monitoring cyber threats and maintain \
         their defenses."
    )
}

fn non_empty<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

fn victim_prompt(v: &RawVictim) -> String {
    format!(
        "Write a concise news summary (2-4 sentences) for this ransomware attack:\n\n\
         Victim: {victim}\n\
         Country: {country}\n\
         Industry: {activity}\n\
         Attacking group: {group}\n\
         Discovered: {discovered}\n\
         Description: {description}\n\n\
         Requirements:\n\
         1. Start with the [Ransomware] tag\n\
         2. Highlight the region, industry, victim, and attacking group\n\
         3. Stress the severity of the threat\n\
         4. Keep the tone factual and newsroom-ready\n\
         5. Do not speculate beyond the provided facts",
        victim = non_empty(&v.victim, "an unnamed company"),
        country = non_empty(&v.country, "unknown"),
        activity = non_empty(&v.activity, "unknown industry"),
        group = non_empty(&v.group, "an unidentified ransomware group"),
        discovered = non_empty(&v.discovered, "an unknown date"),
        description = non_empty(&v.description, "no further details available"),
    )
}

fn attack_prompt(a: &RawAttack) -> String {
    format!(
        "Write a concise news summary (2-4 sentences) for this cybersecurity incident:\n\n\
         Title: {title}\n\
         Date: {date}\n\
         Description: {description}\n\
         Country: {country}\n\n\
         Requirements:\n\
         1. Start with the [Cyber Incident] tag\n\
         2. Extract the key facts without repeating yourself\n\
         3. Stress the importance of the threat\n\
         4. If information is scarce, say details are still under investigation\n\
         5. Do not speculate beyond the provided facts",
        title = non_empty(&a.title, "Cyberattack incident"),
        date = non_empty(&a.date, "unknown"),
        description = non_empty(&a.description, "no further details available"),
        country = non_empty(&a.country, "unknown region"),
    )
}

fn victim_title_prompt(v: &RawVictim) -> String {
    format!(
        "Write a short, punchy news headline (8-14 words) for this ransomware attack:\n\n\
         Victim: {victim}\n\
         Country: {country}\n\
         Industry: {activity}\n\
         Attacking group: {group}\n\
         Discovered: {discovered}\n\n\
         Requirements:\n\
         1. Name the victim, the attacking group, and the region\n\
         2. Newsroom headline style, no tags or brackets\n\
         3. Accurate and not exaggerated",
        victim = non_empty(&v.victim, "an unnamed company"),
        country = non_empty(&v.country, "unknown"),
        activity = non_empty(&v.activity, "unknown industry"),
        group = non_empty(&v.group, "an unidentified ransomware group"),
        discovered = non_empty(&v.discovered, "an unknown date"),
    )
}

fn attack_title_prompt(a: &RawAttack) -> String {
    format!(
        "Write a short, punchy news headline (8-14 words) for this cybersecurity incident:\n\n\
         Title: {title}\n\
         Date: {date}\n\
         Description: {description}\n\n\
         Requirements:\n\
         1. Capture the core of the incident\n\
         2. Newsroom headline style, no tags or brackets\n\
         3. Do not just repeat the original title\n\
         4. Accurate and not exaggerated",
        title = non_empty(&a.title, "Cyberattack incident"),
        date = non_empty(&a.date, "unknown"),
        description = non_empty(&a.description, "no further details available"),
    )
}
