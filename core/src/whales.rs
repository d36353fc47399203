//! Publicly known high-activity wallets the agent may point users at for
//! tracking. Educational only; never a copy-trading signal.

use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    Base,
    Ethereum,
    Arbitrum,
    Optimism,
    Polygon,
    Bsc,
    Avalanche,
}

impl Chain {
    pub fn display_name(self) -> &'static str {
        match self {
            Chain::Base => "Base Chain",
            Chain::Ethereum => "Ethereum Mainnet",
            Chain::Arbitrum => "Arbitrum",
            Chain::Optimism => "Optimism",
            Chain::Polygon => "Polygon",
            Chain::Bsc => "BSC",
            Chain::Avalanche => "Avalanche",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhaleWallet {
    pub chain: Chain,
    pub address: &'static str,
    pub label: &'static str,
}

const fn whale(chain: Chain, address: &'static str, label: &'static str) -> WhaleWallet {
    WhaleWallet {
        chain,
        address,
        label,
    }
}

/// Grouped by chain, in display order.
pub const WHALE_WALLETS: &[WhaleWallet] = &[
    whale(Chain::Base, "0x0c54fccd2e384b4bb6f2e405bf5cbc15a017aafb", "Binance Hot Wallet - Very active in DeFi"),
    whale(Chain::Base, "0x28c6c06298d514db089934071355e5743bf21d60", "Binance 14 - Large holder"),
    whale(Chain::Base, "0x46340b20830761efd32832a74d7169b29feb9758", "Known Base whale - Active trader"),
    whale(Chain::Ethereum, "0x00000000219ab540356cbb839cbe05303d7705fa", "Eth2 Deposit Contract - Institutional"),
    whale(Chain::Ethereum, "0xc882b111a75c0c657fc507c04fbfcd2cc984f071", "Alameda Research wallet - Historical data"),
    whale(Chain::Ethereum, "0x8315177ab297ba92a06054ce80a67ed4dbd7ed3a", "Arbitrage bot - Active"),
    whale(Chain::Ethereum, "0xf977814e90da44bfa03b6295a0616a897441acec", "Binance - High activity"),
    whale(Chain::Arbitrum, "0xb38e8c17e38363af6ebdcb3dae12e0243582891d", "Binance Arbitrum Bridge"),
    whale(Chain::Arbitrum, "0x489ee077994b6658eafa855c308275ead8097c4a", "GMX whale"),
    whale(Chain::Optimism, "0x99c9fc46f92e8a1c0dec1b1747d010903e884be1", "Optimism Bridge"),
    whale(Chain::Optimism, "0x4200000000000000000000000000000000000010", "L2 Standard Bridge"),
    whale(Chain::Polygon, "0x7d1afa7b718fb893db30a3abc0cfc608aacfebb0", "Polygon Bridge"),
    whale(Chain::Polygon, "0xba12222222228d8ba445958a75a0704d566bf2c8", "Balancer Vault"),
    whale(Chain::Bsc, "0x8894e0a0c962cb723c1976a4421c95949be2d4e3", "Binance Hot 6"),
    whale(Chain::Bsc, "0xf977814e90da44bfa03b6295a0616a897441acec", "Binance 8"),
    whale(Chain::Avalanche, "0x9f8c163cba728e99993abe7495f06c0a3c8ac8b9", "Trader Joe Treasury"),
    whale(Chain::Avalanche, "0x2fbab5d3f57b8e68e7377b3f5eb5d03b091249c6", "AVAX Whale"),
];

pub const TRACKING_DISCLAIMER: &str =
    "Tracking whale wallets untuk edukasi, bukan copy trading. Past performance ≠ future results.";

/// Numbered list per chain, blank line between chains, one address per entry.
pub fn render_directory(wallets: &[WhaleWallet]) -> String {
    let mut out = String::new();
    let mut current: Option<Chain> = None;
    let mut index = 0;

    for wallet in wallets {
        if current != Some(wallet.chain) {
            if current.is_some() {
                out.push('\n');
            }
            let _ = writeln!(out, "**{}:**", wallet.chain.display_name());
            current = Some(wallet.chain);
            index = 0;
        }
        index += 1;
        let _ = writeln!(out, "{index}. Address: {}", wallet.address);
        let _ = writeln!(out, "   Type: {}", wallet.label);
    }

    out
}
