//! Deterministic demo backend for running without an API key.
//!
//! Replies are picked by keyword from the latest user message and shaped to
//! the routed mode, so the rest of the pipeline behaves as it would against a
//! real model.

use async_trait::async_trait;
use kid_core::enforce::render_analysis;
use kid_core::mode::ResponseMode;
use kid_core::prompt::Prompt;
use kid_core::risk::{RiskAssessment, RiskFactors, RiskLevel};

use super::{BackendError, BackendReply, LlmBackend};

const FEATURES_REPLY: &str = "Middlekid adalah aplikasi portfolio tracker untuk Base chain yang membantu Anda:

💰 **Track Token Holdings** - Lihat semua token Anda di 17+ blockchain
🖼️ **View NFT Collections** - Galeri NFT Anda
📊 **Monitor DeFi Positions** - Posisi staking, LP, lending
⚡ **Real-time Analytics** - Data portfolio real-time

Masukkan wallet address di search bar untuk memulai!";

const DEFI_REPLY: &str = "DeFi Positions menampilkan posisi DeFi Anda seperti:

• **Staking positions** - Token yang di-stake
• **Liquidity pool positions** - LP token Anda
• **Lending/borrowing** - Posisi di Aave, Compound, dll

Anda bisa melihatnya di tab \"DeFi\" setelah memasukkan wallet address.

App ini otomatis mendeteksi DeFi positions di Stargate, Beethoven X, dan protokol lainnya.";

const ANALYSIS_SETUP_REPLY: &str = "Untuk analisis token lengkap, saya perlu terhubung ke model AI.

Dalam mode lengkap, saya bisa:
• Cek keamanan smart contract
• Analisis risiko token beserta skornya
• Deteksi honeypot dan scam
• Review tokenomics
• Verifikasi team & project

Set environment variable `OPENAI_API_KEY` lalu restart server.";

const GREETING_REPLY: &str = "Halo! Saya Kid, asisten AI untuk Middlekid. 👋

Saya bisa bantu dengan:
• Penjelasan fitur Middlekid
• Cara pakai app
• Informasi DeFi positions
• Analisis token (perlu model AI)

Ada yang bisa saya bantu?";

const SHORT_GREETING: &str =
    "Halo! Saya Kid, asisten AI untuk Middlekid. Ada token, proyek, atau fitur yang ingin Anda tanyakan?";

const CLARIFY_REPLY: &str =
    "Proyek atau token mana yang Anda maksud? Kirimkan alamat kontrak, link, atau nama lengkapnya supaya bisa saya cek.";

const FEATURE_WORDS: &[&str] = &["help", "cara", "bagaimana", "fitur"];
const DEFI_WORDS: &[&str] = &["defi", "staking", "lp", "liquidity"];
const TOKEN_WORDS: &[&str] = &["token", "analisis", "kontrak", "scam", "aman"];
const SUBJECT_WORDS: &[&str] = &[
    "airdrop", "project", "proyek", "coin", "koin", "legit", "safe", "risk", "risiko",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineBackend;

fn mentions(words: &[&str], message: &str) -> bool {
    message
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| words.iter().any(|w| word.eq_ignore_ascii_case(w)))
}

fn information_reply(message: &str) -> &'static str {
    if mentions(FEATURE_WORDS, message) {
        FEATURES_REPLY
    } else if mentions(DEFI_WORDS, message) {
        DEFI_REPLY
    } else if mentions(TOKEN_WORDS, message) {
        ANALYSIS_SETUP_REPLY
    } else {
        GREETING_REPLY
    }
}

fn clarification_reply(message: &str) -> &'static str {
    if mentions(TOKEN_WORDS, message)
        || mentions(SUBJECT_WORDS, message)
        || mentions(DEFI_WORDS, message)
    {
        CLARIFY_REPLY
    } else {
        SHORT_GREETING
    }
}

/// Nothing can be verified offline, so every data point counts as missing.
fn analysis_reply() -> String {
    let unverified = "Tidak dapat diverifikasi dalam mode offline.".to_string();
    let assessment = RiskAssessment {
        summary: "Mode offline: data on-chain dan off-chain untuk proyek ini tidak dapat diambil, sehingga penilaian ini bersifat konservatif.".to_string(),
        key_data: vec![
            "Status verifikasi kontrak: tidak diketahui".to_string(),
            "Likuiditas dan status lock: tidak diketahui".to_string(),
            "Distribusi holder: tidak diketahui".to_string(),
        ],
        risk_factors: RiskFactors {
            security: Some(unverified.clone()),
            technical: Some(unverified.clone()),
            market: Some(unverified),
        },
        score: None,
        risk_level: RiskLevel::High,
    };
    render_analysis(&assessment, None)
}

#[async_trait]
impl LlmBackend for OfflineBackend {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn complete(&self, prompt: &Prompt) -> Result<BackendReply, BackendError> {
        let message = prompt.latest_user_message().unwrap_or_default();
        let text = match prompt.mode {
            ResponseMode::Clarification => clarification_reply(message).to_string(),
            ResponseMode::Information => information_reply(message).to_string(),
            ResponseMode::Analysis => analysis_reply(),
        };
        Ok(BackendReply::text(text))
    }
}

#[cfg(test)]
mod tests {
    use kid_core::chat::ConversationTurn;
    use kid_core::enforce::{contains_score, has_all_sections, has_any_section};
    use kid_core::mode::ModeRouter;
    use kid_core::prompt::build_prompt;

    use super::*;

    async fn reply_to(message: &str) -> (ResponseMode, String) {
        let history: Vec<&ConversationTurn> = Vec::new();
        let decision = ModeRouter::default().route(message, &history);
        let prompt = build_prompt(&decision, &history, message);
        let reply = OfflineBackend.complete(&prompt).await.expect("offline never fails");
        (decision.mode, reply.text)
    }

    #[test]
    fn keywords_match_whole_words() {
        assert!(mentions(DEFI_WORDS, "Gimana posisi LP saya?"));
        assert!(!mentions(DEFI_WORDS, "help"));
        assert_eq!(information_reply("bagaimana cara pakai?"), FEATURES_REPLY);
        assert_eq!(information_reply("apa itu staking"), DEFI_REPLY);
        assert_eq!(information_reply("selamat pagi"), GREETING_REPLY);
    }

    #[tokio::test]
    async fn analysis_reply_is_a_full_high_risk_template() {
        let (mode, text) = reply_to("Is 0x4200000000000000000000000000000000000006 a scam?").await;
        assert_eq!(mode, ResponseMode::Analysis);
        assert!(has_all_sections(&text));
        assert!(text.contains("- Risk Level: High"));

        let enforced = kid_core::mode::ReplyConstraints::analysis().enforce(&text);
        assert!(enforced.violations.is_empty(), "{:?}", enforced.violations);
    }

    #[tokio::test]
    async fn clarification_reply_asks_without_scoring() {
        let (mode, text) = reply_to("is this token safe?").await;
        assert_eq!(mode, ResponseMode::Clarification);
        assert_eq!(text, CLARIFY_REPLY);
        assert!(!has_any_section(&text));
        assert!(!contains_score(&text));

        let enforced = kid_core::mode::ReplyConstraints::clarification().enforce(&text);
        assert!(enforced.violations.is_empty(), "{:?}", enforced.violations);
    }
}
