//! Post-generation checks that hold a backend reply to its mode's constraints.
//!
//! Clarification and information replies are stripped or replaced when they
//! contain analysis output. Analysis replies are parsed into a
//! [`RiskAssessment`]; anything missing is filled with fail-safe content and
//! pushes the risk level to High.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::mode::{ReplyConstraints, ResponseMode, TemplatePolicy};
use crate::risk::{RiskAssessment, RiskFactors, RiskLevel};

/// Sections of the analysis template, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Section {
    Summary,
    KeyData,
    RiskAnalysis,
    ScoreAndRiskLevel,
    ImportantNote,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Summary,
        Section::KeyData,
        Section::RiskAnalysis,
        Section::ScoreAndRiskLevel,
        Section::ImportantNote,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Summary => "Summary",
            Section::KeyData => "Key Data",
            Section::RiskAnalysis => "Risk Analysis",
            Section::ScoreAndRiskLevel => "Score & Risk Level",
            Section::ImportantNote => "Important Note",
        }
    }

    pub fn guidance(self) -> &'static str {
        match self {
            Section::Summary => "(1-2 sentences, neutral and factual)",
            Section::KeyData => "- Bullet points of objective findings",
            Section::RiskAnalysis => "- Security risks\n- Technical risks\n- Market or ecosystem risks",
            Section::ScoreAndRiskLevel => "- Score: X / 100 (if applicable)\n- Risk Level: Low / Medium / High",
            Section::ImportantNote => "- This is not financial advice.\n- All crypto-related activities carry risk.",
        }
    }

    // Lowercase ASCII header spellings, including the Indonesian ones models
    // produce when they translate the template.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Section::Summary => &["summary", "ringkasan"],
            Section::KeyData => &["key data", "data utama", "data kunci", "data penting"],
            Section::RiskAnalysis => &["risk analysis", "analisis risiko", "analisa risiko"],
            Section::ScoreAndRiskLevel => &[
                "score & risk level",
                "score and risk level",
                "skor & tingkat risiko",
                "skor dan tingkat risiko",
                "skor & level risiko",
            ],
            Section::ImportantNote => &["important note", "catatan penting"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    TemplateOutsideAnalysis,
    ScoreNotAllowed,
    RiskLabelNotAllowed,
    TooManySentences { found: usize, max: usize },
    MissingSection { section: Section },
    MissingRiskFactor { factor: &'static str },
    MissingRiskLevel,
    LevelBelowScoreThreshold { stated: RiskLevel, required: RiskLevel },
}

/// A reply after enforcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcedReply {
    pub text: String,
    pub assessment: Option<RiskAssessment>,
    /// What was wrong with the backend's text; empty when it passed as-is
    pub violations: Vec<Violation>,
}

pub const CLARIFICATION_FALLBACK: &str = "Boleh kirimkan alamat kontrak, link, atau nama lengkap proyek yang dimaksud? Setelah itu saya bisa bantu cek risikonya.";

pub const INFORMATION_FALLBACK: &str = "Saya Kid, asisten AI Middlekid. Saya bisa bantu menjelaskan fitur Middlekid, cara melacak wallet dan posisi DeFi, serta membaca hasil analisis token. Ada yang ingin Anda ketahui?";

const UNAVAILABLE: &str = "Data tidak tersedia; diperlakukan sebagai risiko tinggi.";
const NOTE_NOT_ADVICE: &str = "Ini bukan nasihat keuangan.";
const NOTE_ALL_RISKY: &str = "Semua aktivitas kripto memiliki risiko.";

static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\b(?:score|skor)\b\**\s*[:=]?\s*\**\s*(\d{1,3})\b|\b(\d{1,3})\s*/\s*100\b)")
        .expect("score pattern is valid")
});

static RISK_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\b(?:risk\s*level|tingkat\s*risiko|level\s*risiko)\b\**\s*[:=]|\b(?:low|medium|high)\s+risk\b|\brisiko\s+(?:rendah|sedang|menengah|tinggi)\b)",
    )
    .expect("risk label pattern is valid")
});

static LEVEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\b(?:risk\s*level|tingkat\s*risiko|level\s*risiko)\b\**\s*[:=]?\s*\**\s*(low|medium|high|rendah|sedang|menengah|tinggi)\b|\b(low|medium|high)\s+risk\b|\brisiko\s+(rendah|sedang|menengah|tinggi)\b)",
    )
    .expect("level pattern is valid")
});

fn parse_level(word: &str) -> Option<RiskLevel> {
    match word.to_ascii_lowercase().as_str() {
        "low" | "rendah" => Some(RiskLevel::Low),
        "medium" | "sedang" | "menengah" => Some(RiskLevel::Medium),
        "high" | "tinggi" => Some(RiskLevel::High),
        _ => None,
    }
}

/// Strip markdown decoration and list markers from the start of a line.
fn clean_line(line: &str) -> &str {
    line.trim()
        .trim_start_matches(|c: char| matches!(c, '#' | '*' | '_' | '-' | '•' | '>') || c.is_whitespace())
}

/// If `line` is a template header, the section and any text after the colon.
fn match_header(line: &str) -> Option<(Section, String)> {
    let cleaned = clean_line(line);
    for section in Section::ALL {
        for alias in section.aliases() {
            let len = alias.len();
            if cleaned.len() < len || !cleaned.is_char_boundary(len) {
                continue;
            }
            if !cleaned[..len].eq_ignore_ascii_case(alias) {
                continue;
            }
            let rest = cleaned[len..].trim_start_matches(['*', '_']);
            if rest.trim().is_empty() {
                return Some((section, String::new()));
            }
            if let Some(after) = rest.strip_prefix(':') {
                let after = after.trim().trim_matches(['*', '_']).trim();
                return Some((section, after.to_string()));
            }
        }
    }
    None
}

#[derive(Debug, Default)]
struct ParsedReply {
    sections: Vec<(Section, Vec<String>)>,
}

impl ParsedReply {
    fn parse(text: &str) -> Self {
        let mut parsed = ParsedReply::default();
        let mut current: Option<usize> = None;

        for line in text.lines() {
            if let Some((section, rest)) = match_header(line) {
                let idx = match parsed.sections.iter().position(|(s, _)| *s == section) {
                    Some(idx) => idx,
                    None => {
                        parsed.sections.push((section, Vec::new()));
                        parsed.sections.len() - 1
                    }
                };
                if !rest.is_empty() {
                    parsed.sections[idx].1.push(rest);
                }
                current = Some(idx);
            } else if let Some(idx) = current {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    parsed.sections[idx].1.push(trimmed.to_string());
                }
            }
        }

        parsed
    }

    /// Non-empty body lines of a section, if it is present.
    fn body(&self, section: Section) -> Option<&[String]> {
        self.sections
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, lines)| lines.as_slice())
            .filter(|lines| !lines.is_empty())
    }

    fn header_count(&self) -> usize {
        self.sections.len()
    }
}

fn has_score(text: &str) -> bool {
    SCORE_RE.is_match(text)
}

fn has_risk_label(text: &str) -> bool {
    RISK_LABEL_RE.is_match(text)
}

/// Split into sentences on terminal punctuation followed by whitespace, and
/// on line breaks.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        let end = if c == '\n' {
            Some(idx)
        } else if matches!(c, '.' | '?' | '!') {
            while let Some(&(_, next)) = chars.peek() {
                if matches!(next, '.' | '?' | '!') {
                    chars.next();
                } else {
                    break;
                }
            }
            match chars.peek() {
                None => Some(text.len()),
                Some(&(next_idx, next)) if next.is_whitespace() => Some(next_idx),
                _ => None,
            }
        } else {
            None
        };

        if let Some(end) = end {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                out.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start.min(text.len())..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

fn bullet_text(line: &str) -> String {
    let cleaned = clean_line(line);
    let without_number = match cleaned.find(". ") {
        Some(pos) if pos <= 3 && cleaned[..pos].chars().all(|c| c.is_ascii_digit()) => {
            &cleaned[pos + 2..]
        }
        _ => cleaned,
    };
    without_number.trim().to_string()
}

const SECURITY_PREFIXES: &[&str] = &["security", "keamanan", "risiko keamanan"];
const TECHNICAL_PREFIXES: &[&str] = &["technical", "teknis", "risiko teknis"];
const MARKET_PREFIXES: &[&str] = &[
    "market",
    "ecosystem",
    "pasar",
    "ekosistem",
    "risiko pasar",
    "risiko ekosistem",
];

fn starts_with_any(text: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| {
        text.len() >= p.len() && text.is_char_boundary(p.len()) && text[..p.len()].eq_ignore_ascii_case(p)
    })
}

fn parse_risk_factors(lines: &[String]) -> RiskFactors {
    let mut security: Vec<String> = Vec::new();
    let mut technical: Vec<String> = Vec::new();
    let mut market: Vec<String> = Vec::new();
    let mut current: Option<usize> = None;

    for line in lines {
        let cleaned = clean_line(line);
        if starts_with_any(cleaned, SECURITY_PREFIXES) {
            current = Some(0);
        } else if starts_with_any(cleaned, TECHNICAL_PREFIXES) {
            current = Some(1);
        } else if starts_with_any(cleaned, MARKET_PREFIXES) {
            current = Some(2);
        }
        let bucket = match current {
            Some(0) => &mut security,
            Some(1) => &mut technical,
            Some(2) => &mut market,
            _ => continue,
        };
        bucket.push(cleaned.to_string());
    }

    let join = |lines: Vec<String>| (!lines.is_empty()).then(|| lines.join(" "));
    RiskFactors {
        security: join(security),
        technical: join(technical),
        market: join(market),
    }
}

impl ReplyConstraints {
    /// Hold `reply` to these constraints.
    pub fn enforce(&self, reply: &str) -> EnforcedReply {
        match self.mode {
            ResponseMode::Clarification => self.enforce_clarification(reply),
            ResponseMode::Information => self.enforce_information(reply),
            ResponseMode::Analysis => enforce_analysis(reply),
        }
    }

    fn forbidden_content(&self, reply: &str, parsed: &ParsedReply) -> Vec<Violation> {
        let mut violations = Vec::new();
        if self.template == TemplatePolicy::Forbidden && parsed.header_count() > 0 {
            violations.push(Violation::TemplateOutsideAnalysis);
        }
        if !self.score_allowed && has_score(reply) {
            violations.push(Violation::ScoreNotAllowed);
        }
        if !self.risk_label_allowed && has_risk_label(reply) {
            violations.push(Violation::RiskLabelNotAllowed);
        }
        violations
    }

    fn enforce_clarification(&self, reply: &str) -> EnforcedReply {
        let parsed = ParsedReply::parse(reply);
        let mut violations = self.forbidden_content(reply, &parsed);

        if !violations.is_empty() || reply.trim().is_empty() {
            return EnforcedReply {
                text: CLARIFICATION_FALLBACK.to_string(),
                assessment: None,
                violations,
            };
        }

        let all = sentences(reply);
        let text = match self.max_sentences {
            Some(max) if all.len() > max => {
                violations.push(Violation::TooManySentences {
                    found: all.len(),
                    max,
                });
                all[..max].join(" ")
            }
            _ => reply.trim().to_string(),
        };

        EnforcedReply {
            text,
            assessment: None,
            violations,
        }
    }

    fn enforce_information(&self, reply: &str) -> EnforcedReply {
        let parsed = ParsedReply::parse(reply);
        let violations = self.forbidden_content(reply, &parsed);

        if violations.is_empty() {
            return EnforcedReply {
                text: reply.trim().to_string(),
                assessment: None,
                violations,
            };
        }

        // A full analysis dressed up as support text is not salvageable.
        let text = if parsed.header_count() >= 3 {
            String::new()
        } else {
            reply
                .lines()
                .filter(|line| match_header(line).is_none())
                .filter(|line| self.score_allowed || !has_score(line))
                .filter(|line| self.risk_label_allowed || !has_risk_label(line))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        };

        EnforcedReply {
            text: if text.is_empty() {
                INFORMATION_FALLBACK.to_string()
            } else {
                text
            },
            assessment: None,
            violations,
        }
    }
}

fn enforce_analysis(reply: &str) -> EnforcedReply {
    let parsed = ParsedReply::parse(reply);
    let mut violations = Vec::new();

    for section in Section::ALL {
        if parsed.body(section).is_none() {
            violations.push(Violation::MissingSection { section });
        }
    }

    let summary = parsed
        .body(Section::Summary)
        .map(|lines| lines.join(" "))
        .unwrap_or_else(|| UNAVAILABLE.to_string());

    let key_data: Vec<String> = parsed
        .body(Section::KeyData)
        .map(|lines| {
            lines
                .iter()
                .map(|l| bullet_text(l))
                .filter(|l| !l.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mut risk_factors = parsed
        .body(Section::RiskAnalysis)
        .map(parse_risk_factors)
        .unwrap_or_default();
    for (factor, slot) in [
        ("security", &mut risk_factors.security),
        ("technical", &mut risk_factors.technical),
        ("market", &mut risk_factors.market),
    ] {
        if slot.is_none() {
            if parsed.body(Section::RiskAnalysis).is_some() {
                violations.push(Violation::MissingRiskFactor { factor });
            }
            *slot = Some(UNAVAILABLE.to_string());
        }
    }

    let score_text = parsed
        .body(Section::ScoreAndRiskLevel)
        .map(|lines| lines.join("\n"))
        .unwrap_or_default();
    let score = SCORE_RE
        .captures(&score_text)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .and_then(|m| m.as_str().parse::<u8>().ok())
        .filter(|score| *score <= 100);
    let stated = LEVEL_RE.captures(&score_text).and_then(|caps| {
        (1..=3)
            .filter_map(|i| caps.get(i))
            .find_map(|m| parse_level(m.as_str()))
    });

    if key_data.is_empty() && parsed.body(Section::KeyData).is_some() {
        violations.push(Violation::MissingSection {
            section: Section::KeyData,
        });
    }
    let data_missing = !violations.is_empty();
    let mut level = match stated {
        Some(level) => level,
        None => {
            if parsed.body(Section::ScoreAndRiskLevel).is_some() {
                violations.push(Violation::MissingRiskLevel);
            }
            RiskLevel::High
        }
    };
    if let (Some(stated), Some(score)) = (stated, score) {
        let required = RiskLevel::from_score(score);
        if required > stated {
            violations.push(Violation::LevelBelowScoreThreshold { stated, required });
            level = required;
        }
    }
    if data_missing {
        level = RiskLevel::High;
    }

    let key_data = if key_data.is_empty() {
        vec![UNAVAILABLE.to_string()]
    } else {
        key_data
    };

    let assessment = RiskAssessment {
        summary,
        key_data,
        risk_factors,
        score,
        risk_level: level,
    };

    let text = if violations.is_empty() {
        reply.trim().to_string()
    } else {
        let note = parsed.body(Section::ImportantNote);
        render_analysis(&assessment, note)
    };

    EnforcedReply {
        text,
        assessment: Some(assessment),
        violations,
    }
}

/// Canonical five-section rendering of an assessment.
pub fn render_analysis(assessment: &RiskAssessment, note: Option<&[String]>) -> String {
    let factor = |value: &Option<String>| value.clone().unwrap_or_else(|| UNAVAILABLE.to_string());
    let score = assessment
        .score
        .map(|s| format!("{s} / 100"))
        .unwrap_or_else(|| "N/A".to_string());

    let mut out = String::new();
    out.push_str(&format!("{}:\n{}\n\n", Section::Summary.title(), assessment.summary));

    out.push_str(&format!("{}:\n", Section::KeyData.title()));
    for item in &assessment.key_data {
        out.push_str(&format!("- {item}\n"));
    }

    out.push_str(&format!("\n{}:\n", Section::RiskAnalysis.title()));
    out.push_str(&format!("- Security risks: {}\n", strip_factor_label(&factor(&assessment.risk_factors.security))));
    out.push_str(&format!("- Technical risks: {}\n", strip_factor_label(&factor(&assessment.risk_factors.technical))));
    out.push_str(&format!(
        "- Market or ecosystem risks: {}\n",
        strip_factor_label(&factor(&assessment.risk_factors.market))
    ));

    out.push_str(&format!("\n{}:\n", Section::ScoreAndRiskLevel.title()));
    out.push_str(&format!("- Score: {score}\n"));
    out.push_str(&format!("- Risk Level: {}\n", assessment.risk_level));

    out.push_str(&format!("\n{}:\n", Section::ImportantNote.title()));
    match note {
        Some(lines) => {
            for line in lines {
                out.push_str(&format!("- {}\n", bullet_text(line)));
            }
        }
        None => {
            out.push_str(&format!("- {NOTE_NOT_ADVICE}\n- {NOTE_ALL_RISKY}\n"));
        }
    }

    out.trim_end().to_string()
}

/// "Security risks: foo" -> "foo", so re-rendering does not double the label.
fn strip_factor_label(text: &str) -> &str {
    match text.split_once(':') {
        Some((label, rest))
            if label.len() <= 30
                && (starts_with_any(label, SECURITY_PREFIXES)
                    || starts_with_any(label, TECHNICAL_PREFIXES)
                    || starts_with_any(label, MARKET_PREFIXES)) =>
        {
            rest.trim()
        }
        _ => text,
    }
}

/// Whether every template section header is present in `text`.
pub fn has_all_sections(text: &str) -> bool {
    let parsed = ParsedReply::parse(text);
    Section::ALL
        .iter()
        .all(|section| parsed.sections.iter().any(|(s, _)| s == section))
}

/// Whether any template section header is present in `text`.
pub fn has_any_section(text: &str) -> bool {
    ParsedReply::parse(text).header_count() > 0
}

/// Whether `text` contains a numeric score.
pub fn contains_score(text: &str) -> bool {
    has_score(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_ANALYSIS: &str = "\
**Summary:**
Uniswap adalah DEX besar di Ethereum.

**Key Data:**
- TVL sekitar $4B
- Diaudit beberapa kali

**Risk Analysis:**
- Security risks: riwayat audit baik
- Technical risks: kompleksitas smart contract
- Market or ecosystem risks: persaingan DEX

**Score & Risk Level:**
- Score: 85 / 100
- Risk Level: Low

**Important Note:**
- This is not financial advice.
- All crypto-related activities carry risk.";

    #[test]
    fn header_matching_accepts_markdown_and_indonesian() {
        assert_eq!(
            match_header("**Summary:**"),
            Some((Section::Summary, String::new()))
        );
        assert_eq!(
            match_header("### Analisis Risiko"),
            Some((Section::RiskAnalysis, String::new()))
        );
        assert_eq!(
            match_header("Summary: token kecil"),
            Some((Section::Summary, "token kecil".to_string()))
        );
        assert_eq!(match_header("Summary of the findings is below"), None);
    }

    #[test]
    fn sentence_split_ignores_decimals_and_groups_ellipses() {
        assert_eq!(
            sentences("Harga 0.5 USD. Benarkah?! Ya... oke"),
            vec!["Harga 0.5 USD.", "Benarkah?!", "Ya...", "oke"]
        );
    }

    #[test]
    fn complete_analysis_passes_untouched() {
        let enforced = ReplyConstraints::analysis().enforce(FULL_ANALYSIS);
        assert!(enforced.violations.is_empty(), "{:?}", enforced.violations);
        assert_eq!(enforced.text, FULL_ANALYSIS);

        let assessment = enforced.assessment.expect("analysis yields an assessment");
        assert_eq!(assessment.score, Some(85));
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert_eq!(assessment.key_data, vec!["TVL sekitar $4B", "Diaudit beberapa kali"]);
        assert!(assessment.risk_factors.security.is_some());
        assert!(assessment.risk_factors.technical.is_some());
        assert!(assessment.risk_factors.market.is_some());
    }

    #[test]
    fn optimistic_level_is_raised_to_score_threshold() {
        let reply = FULL_ANALYSIS.replace("Score: 85", "Score: 65");
        let enforced = ReplyConstraints::analysis().enforce(&reply);
        assert_eq!(
            enforced.violations,
            vec![Violation::LevelBelowScoreThreshold {
                stated: RiskLevel::Low,
                required: RiskLevel::Medium
            }]
        );
        assert!(enforced.text.contains("- Risk Level: Medium"));
        assert!(has_all_sections(&enforced.text));
    }

    #[test]
    fn missing_sections_are_filled_and_force_high_risk() {
        let reply = "Summary: Token baru di Base.\n\nScore & Risk Level:\n- Risk Level: Low";
        let enforced = ReplyConstraints::analysis().enforce(reply);

        assert!(enforced.violations.contains(&Violation::MissingSection {
            section: Section::KeyData
        }));
        assert!(has_all_sections(&enforced.text));
        assert!(enforced.text.contains("- Risk Level: High"));
        assert!(enforced.text.contains(NOTE_NOT_ADVICE));

        let assessment = enforced.assessment.expect("assessment");
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.summary, "Token baru di Base.");
    }

    #[test]
    fn empty_key_data_is_rerendered_as_high_risk() {
        let reply = FULL_ANALYSIS.replace("- TVL sekitar $4B\n- Diaudit beberapa kali", "-");
        let enforced = ReplyConstraints::analysis().enforce(&reply);

        assert!(enforced.violations.contains(&Violation::MissingSection {
            section: Section::KeyData
        }));
        assert!(enforced.text.contains("- Risk Level: High"));
        assert!(!enforced.text.contains("Risk Level: Low"));
        assert_eq!(
            enforced.assessment.map(|a| a.risk_level),
            Some(RiskLevel::High)
        );
    }

    #[test]
    fn bold_labels_keep_the_stated_score() {
        let reply = FULL_ANALYSIS
            .replace("- Score: 85 / 100", "- **Score**: 85")
            .replace("- Risk Level: Low", "- **Risk Level**: Low");
        let enforced = ReplyConstraints::analysis().enforce(&reply);

        assert!(enforced.violations.is_empty(), "{:?}", enforced.violations);
        let assessment = enforced.assessment.expect("assessment");
        assert_eq!(assessment.score, Some(85));
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert!(contains_score("**Skor**: 40"));
    }

    #[test]
    fn free_text_in_analysis_mode_becomes_template() {
        let enforced = ReplyConstraints::analysis().enforce("Looks fine to me.");
        assert_eq!(enforced.violations.len(), 5);
        assert!(has_all_sections(&enforced.text));
        assert_eq!(
            enforced.assessment.map(|a| a.risk_level),
            Some(RiskLevel::High)
        );
    }

    #[test]
    fn clarification_with_score_is_replaced() {
        let enforced = ReplyConstraints::clarification()
            .enforce("Token ini kelihatannya oke. Score: 70 / 100.");
        assert_eq!(enforced.text, CLARIFICATION_FALLBACK);
        assert!(enforced.violations.contains(&Violation::ScoreNotAllowed));
        assert!(!contains_score(&enforced.text));
    }

    #[test]
    fn clarification_with_template_is_replaced() {
        let enforced = ReplyConstraints::clarification().enforce(FULL_ANALYSIS);
        assert_eq!(enforced.text, CLARIFICATION_FALLBACK);
        assert!(!has_any_section(&enforced.text));
    }

    #[test]
    fn long_clarification_is_cut_to_three_sentences() {
        let enforced = ReplyConstraints::clarification()
            .enforce("Token yang mana? Boleh kirim alamatnya? Di chain apa? Kapan Anda membelinya?");
        assert_eq!(
            enforced.text,
            "Token yang mana? Boleh kirim alamatnya? Di chain apa?"
        );
        assert_eq!(
            enforced.violations,
            vec![Violation::TooManySentences { found: 4, max: 3 }]
        );
    }

    #[test]
    fn short_clarification_passes() {
        let enforced = ReplyConstraints::clarification().enforce("Token yang mana yang Anda maksud?");
        assert!(enforced.violations.is_empty());
        assert_eq!(enforced.text, "Token yang mana yang Anda maksud?");
    }

    #[test]
    fn information_drops_unrequested_score_lines() {
        let reply = "Tab DeFi menampilkan posisi staking Anda.\nRisk Level: Low\nBuka tab DeFi setelah memasukkan wallet.";
        let enforced = ReplyConstraints::information(false).enforce(reply);
        assert_eq!(
            enforced.text,
            "Tab DeFi menampilkan posisi staking Anda.\nBuka tab DeFi setelah memasukkan wallet."
        );
        assert!(enforced.violations.contains(&Violation::RiskLabelNotAllowed));
    }

    #[test]
    fn information_replaces_full_analysis() {
        let enforced = ReplyConstraints::information(false).enforce(FULL_ANALYSIS);
        assert_eq!(enforced.text, INFORMATION_FALLBACK);
    }

    #[test]
    fn information_keeps_requested_score() {
        let reply = "Health score dihitung dari 0 sampai 100; skor 80 berarti sehat.";
        let enforced = ReplyConstraints::information(true).enforce(reply);
        assert!(enforced.violations.is_empty());
        assert_eq!(enforced.text, reply);
    }
}
