//! Risk classification rules applied in analysis mode.
//!
//! Three independent rubrics, one per project category. All of them fail
//! toward caution: a data point that is unknown counts against the project.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const LOW_MIN_SCORE: u8 = 80;
    pub const MEDIUM_MIN_SCORE: u8 = 60;

    /// Thresholds for scored (established) projects.
    pub fn from_score(score: u8) -> Self {
        if score >= Self::LOW_MIN_SCORE {
            RiskLevel::Low
        } else if score >= Self::MEDIUM_MIN_SCORE {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// The more cautious of two levels.
    pub fn most_cautious(self, other: RiskLevel) -> RiskLevel {
        self.max(other)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectCategory {
    /// Large coin, Layer-1 or mature DeFi protocol
    Established,
    /// Small-cap, newly launched or meme token
    SmallCap,
    Airdrop,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScoringError {
    #[error("factor `{factor}` must be between 0 and 100, got {value}")]
    FactorOutOfRange { factor: &'static str, value: u8 },
}

/// Sub-scores for an established project, each normalized to 0..=100.
/// `None` means the data point could not be established.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstablishedFactors {
    pub fundamentals: Option<u8>,
    pub security: Option<u8>,
    pub ecosystem: Option<u8>,
    pub onchain: Option<u8>,
    pub regulatory: Option<u8>,
}

impl EstablishedFactors {
    /// (name, weight in percent, value)
    fn weighted(&self) -> [(&'static str, u32, Option<u8>); 5] {
        [
            ("fundamentals", 30, self.fundamentals),
            ("security", 25, self.security),
            ("ecosystem", 20, self.ecosystem),
            ("onchain", 15, self.onchain),
            ("regulatory", 10, self.regulatory),
        ]
    }
}

/// Red-flag checklist for small-cap and new tokens.
/// `None` means the check could not be performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSafetyChecks {
    pub liquidity_locked: Option<bool>,
    pub owner_can_mint_unlimited: Option<bool>,
    pub honeypot: Option<bool>,
    pub contract_verified: Option<bool>,
    pub ownership_renounced: Option<bool>,
    pub tokenomics_clear: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmallCapVerdict {
    /// Still high risk by policy
    LikelyLegit,
    Speculative,
    LikelyScam,
}

impl SmallCapVerdict {
    pub fn label(self) -> &'static str {
        match self {
            SmallCapVerdict::LikelyLegit => "Likely Legit (still high risk)",
            SmallCapVerdict::Speculative => "Speculative / High Risk",
            SmallCapVerdict::LikelyScam => "Likely Scam",
        }
    }
}

/// Evidence for an airdrop interaction. `None` means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirdropChecks {
    pub project_functional: Option<bool>,
    pub dangerous_approvals: Option<bool>,
    pub low_risk_contract: Option<bool>,
    pub requests_secret_keys: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AirdropVerdict {
    LowRiskInteraction,
    Experimental,
    HighRiskAvoid,
}

impl AirdropVerdict {
    pub fn label(self) -> &'static str {
        match self {
            AirdropVerdict::LowRiskInteraction => "Low-risk interaction",
            AirdropVerdict::Experimental => "Experimental",
            AirdropVerdict::HighRiskAvoid => "High-risk / Avoid",
        }
    }
}

/// Outcome of running one rubric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: ProjectCategory,
    pub score: Option<u8>,
    pub level: RiskLevel,
    /// Category-specific verdict label (small-cap and airdrop rubrics)
    pub verdict: Option<&'static str>,
    /// Red flags and missing data points that drove the outcome
    pub reasons: Vec<String>,
}

/// Weighted 0-100 score for an established project.
///
/// A missing factor makes the score unknowable; the project is then High risk
/// with no score.
pub fn classify_established(factors: &EstablishedFactors) -> Result<Classification, ScoringError> {
    let mut total = 0u32;
    let mut reasons = Vec::new();

    for (factor, weight, value) in factors.weighted() {
        match value {
            Some(value) if value > 100 => {
                return Err(ScoringError::FactorOutOfRange { factor, value });
            }
            Some(value) => total += weight * u32::from(value),
            None => reasons.push(format!("{factor} data unavailable")),
        }
    }

    if !reasons.is_empty() {
        return Ok(Classification {
            category: ProjectCategory::Established,
            score: None,
            level: RiskLevel::High,
            verdict: None,
            reasons,
        });
    }

    // Weights sum to 100. Truncate so a fractional score never crosses a
    // threshold upward.
    let score = (total / 100) as u8;
    Ok(Classification {
        category: ProjectCategory::Established,
        score: Some(score),
        level: RiskLevel::from_score(score),
        verdict: None,
        reasons,
    })
}

/// Anti-scam rubric for small or new tokens. Always High risk; the verdict
/// says how bad.
pub fn classify_small_cap(checks: &TokenSafetyChecks) -> Classification {
    let mut reasons = Vec::new();
    let mut critical = false;

    red_flag(
        &mut reasons,
        checks.liquidity_locked,
        false,
        "liquidity is not locked and can be removed",
        "liquidity lock status unknown",
    );
    critical |= red_flag(
        &mut reasons,
        checks.owner_can_mint_unlimited,
        true,
        "owner can mint unlimited tokens",
        "minting privileges unknown",
    );
    critical |= red_flag(
        &mut reasons,
        checks.honeypot,
        true,
        "honeypot behavior: holders cannot sell",
        "sellability unknown",
    );
    red_flag(
        &mut reasons,
        checks.contract_verified,
        false,
        "contract source is not verified",
        "contract verification status unknown",
    );
    red_flag(
        &mut reasons,
        checks.ownership_renounced,
        false,
        "ownership is not renounced",
        "ownership status unknown",
    );
    red_flag(
        &mut reasons,
        checks.tokenomics_clear,
        false,
        "token supply or tokenomics are unclear",
        "tokenomics unknown",
    );

    let verdict = if critical || reasons.len() >= 3 {
        SmallCapVerdict::LikelyScam
    } else if !reasons.is_empty() {
        SmallCapVerdict::Speculative
    } else {
        SmallCapVerdict::LikelyLegit
    };

    Classification {
        category: ProjectCategory::SmallCap,
        score: None,
        level: RiskLevel::High,
        verdict: Some(verdict.label()),
        reasons,
    }
}

/// Records a red flag when `value` equals `bad`, or a missing-data note when
/// the check was not performed. Returns whether the red flag fired.
fn red_flag(
    reasons: &mut Vec<String>,
    value: Option<bool>,
    bad: bool,
    red: &str,
    unknown: &str,
) -> bool {
    match value {
        Some(v) if v == bad => {
            reasons.push(red.to_string());
            true
        }
        Some(_) => false,
        None => {
            reasons.push(unknown.to_string());
            false
        }
    }
}

/// Airdrops are risky until proven otherwise.
pub fn classify_airdrop(checks: &AirdropChecks) -> Classification {
    let mut reasons = Vec::new();

    if checks.requests_secret_keys != Some(false) {
        reasons.push(match checks.requests_secret_keys {
            Some(true) => "asks for a private key or seed phrase".to_string(),
            _ => "unknown whether it asks for private keys".to_string(),
        });
    }
    if checks.dangerous_approvals != Some(false) {
        reasons.push(match checks.dangerous_approvals {
            Some(true) => "requires dangerous or unlimited token approvals".to_string(),
            _ => "approval scope unknown".to_string(),
        });
    }
    let unknowns = [checks.project_functional, checks.low_risk_contract]
        .iter()
        .filter(|v| v.is_none())
        .count();
    if unknowns > 0 {
        reasons.push("project functionality or contract behavior unknown".to_string());
    }

    let verdict = if !reasons.is_empty() {
        AirdropVerdict::HighRiskAvoid
    } else if checks.project_functional == Some(true) && checks.low_risk_contract == Some(true) {
        AirdropVerdict::LowRiskInteraction
    } else {
        if checks.project_functional == Some(false) {
            reasons.push("core project has no working product yet".to_string());
        }
        if checks.low_risk_contract == Some(false) {
            reasons.push("contract interaction is not minimal".to_string());
        }
        AirdropVerdict::Experimental
    };

    let level = match verdict {
        AirdropVerdict::LowRiskInteraction => RiskLevel::Low,
        AirdropVerdict::Experimental => RiskLevel::Medium,
        AirdropVerdict::HighRiskAvoid => RiskLevel::High,
    };

    Classification {
        category: ProjectCategory::Airdrop,
        score: None,
        level,
        verdict: Some(verdict.label()),
        reasons,
    }
}

/// Risk factors, one paragraph or bullet list per dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RiskFactors {
    pub security: Option<String>,
    pub technical: Option<String>,
    pub market: Option<String>,
}

/// Structured form of an analysis-mode reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub summary: String,
    pub key_data: Vec<String>,
    pub risk_factors: RiskFactors,
    /// 0-100, absent when the rubric does not produce a score
    pub score: Option<u8>,
    pub risk_level: RiskLevel,
}
