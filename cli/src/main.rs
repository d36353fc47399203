use clap::{Args, Parser, Subcommand};
use kid_core::risk::{AirdropChecks, EstablishedFactors, TokenSafetyChecks};

mod commands;
mod util;

#[derive(Parser)]
#[command(
    name = "kid",
    version,
    about = "Kid agent CLI: chat with the agent, check health, and inspect routing and risk scoring locally"
)]
struct Cli {
    /// API base URL
    #[arg(long, env = "KID_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// Send a chat message to the agent
    Chat {
        /// The message to send
        message: String,
        /// Conversation history as JSON (file path, or "-" for stdin)
        #[arg(long)]
        history: Option<String>,
        /// Print compact JSON
        #[arg(long)]
        raw: bool,
    },
    /// Show how a message would be routed (local, no network)
    Mode {
        message: String,
        /// Conversation history as JSON (file path, or "-" for stdin)
        #[arg(long)]
        history: Option<String>,
        /// History window, as configured on the server
        #[arg(long, env = "KID_HISTORY_WINDOW", default_value_t = 10)]
        window: usize,
        /// Let identifiers from earlier user turns enable analysis
        #[arg(long, env = "KID_IDENTIFIER_FROM_HISTORY", default_value_t = true, action = clap::ArgAction::Set)]
        history_identifiers: bool,
    },
    /// Run a risk rubric locally (local, no network)
    Score {
        #[command(subcommand)]
        command: ScoreCommands,
    },
    /// Send one message end to end and report whether a usable reply came back
    Probe {
        #[arg(long, default_value = "Halo, siapa kamu?")]
        message: String,
    },
}

#[derive(Subcommand)]
enum ScoreCommands {
    /// Weighted 0-100 score for a large coin or established protocol
    Established(EstablishedArgs),
    /// Anti-scam checklist for a small-cap or new token
    SmallCap(SmallCapArgs),
    /// Airdrop interaction checklist
    Airdrop(AirdropArgs),
}

/// Each factor is a 0-100 sub-score. Omit a factor whose data is unavailable.
#[derive(Args)]
struct EstablishedArgs {
    /// Fundamentals and real use case (30%)
    #[arg(long)]
    fundamentals: Option<u8>,
    /// Security posture and audit history (25%)
    #[arg(long)]
    security: Option<u8>,
    /// Ecosystem strength, developers and community (20%)
    #[arg(long)]
    ecosystem: Option<u8>,
    /// On-chain metrics such as TVL and activity (15%)
    #[arg(long)]
    onchain: Option<u8>,
    /// Regulatory and technical risk (10%)
    #[arg(long)]
    regulatory: Option<u8>,
}

/// Each check is true or false. Omit a check that could not be performed.
#[derive(Args)]
struct SmallCapArgs {
    #[arg(long)]
    liquidity_locked: Option<bool>,
    #[arg(long)]
    owner_can_mint_unlimited: Option<bool>,
    #[arg(long)]
    honeypot: Option<bool>,
    #[arg(long)]
    contract_verified: Option<bool>,
    #[arg(long)]
    ownership_renounced: Option<bool>,
    #[arg(long)]
    tokenomics_clear: Option<bool>,
}

#[derive(Args)]
struct AirdropArgs {
    #[arg(long)]
    project_functional: Option<bool>,
    #[arg(long)]
    dangerous_approvals: Option<bool>,
    #[arg(long)]
    low_risk_contract: Option<bool>,
    #[arg(long)]
    requests_secret_keys: Option<bool>,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Health => commands::health::run(&cli.api_url).await,
        Commands::Chat {
            message,
            history,
            raw,
        } => commands::chat::run(&cli.api_url, &message, history.as_deref(), raw).await,
        Commands::Mode {
            message,
            history,
            window,
            history_identifiers,
        } => commands::mode::run(&message, history.as_deref(), window, history_identifiers),
        Commands::Score { command } => match command {
            ScoreCommands::Established(args) => commands::score::established(EstablishedFactors {
                fundamentals: args.fundamentals,
                security: args.security,
                ecosystem: args.ecosystem,
                onchain: args.onchain,
                regulatory: args.regulatory,
            }),
            ScoreCommands::SmallCap(args) => commands::score::small_cap(TokenSafetyChecks {
                liquidity_locked: args.liquidity_locked,
                owner_can_mint_unlimited: args.owner_can_mint_unlimited,
                honeypot: args.honeypot,
                contract_verified: args.contract_verified,
                ownership_renounced: args.ownership_renounced,
                tokenomics_clear: args.tokenomics_clear,
            }),
            ScoreCommands::Airdrop(args) => commands::score::airdrop(AirdropChecks {
                project_functional: args.project_functional,
                dangerous_approvals: args.dangerous_approvals,
                low_risk_contract: args.low_risk_contract,
                requests_secret_keys: args.requests_secret_keys,
            }),
        },
        Commands::Probe { message } => commands::probe::run(&cli.api_url, &message).await,
    };

    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_optional_boolean_checks() {
        let cli = Cli::try_parse_from([
            "kid",
            "score",
            "small-cap",
            "--liquidity-locked",
            "false",
            "--honeypot",
            "false",
        ])
        .expect("arguments should parse");
        match cli.command {
            Commands::Score {
                command: ScoreCommands::SmallCap(args),
            } => {
                assert_eq!(args.liquidity_locked, Some(false));
                assert_eq!(args.honeypot, Some(false));
                assert_eq!(args.contract_verified, None);
            }
            _ => panic!("expected score small-cap"),
        }
    }
}
