use kid_core::risk::{
    AirdropChecks, Classification, EstablishedFactors, TokenSafetyChecks, classify_airdrop,
    classify_established, classify_small_cap,
};

use crate::util::{exit_error, pretty};

pub fn established(factors: EstablishedFactors) -> i32 {
    match classify_established(&factors) {
        Ok(classification) => print(&classification),
        Err(e) => exit_error(
            &e.to_string(),
            Some("Each factor is a 0-100 sub-score; omit a factor if the data is unavailable"),
        ),
    }
}

pub fn small_cap(checks: TokenSafetyChecks) -> i32 {
    print(&classify_small_cap(&checks))
}

pub fn airdrop(checks: AirdropChecks) -> i32 {
    print(&classify_airdrop(&checks))
}

fn print(classification: &Classification) -> i32 {
    match serde_json::to_value(classification) {
        Ok(value) => {
            println!("{}", pretty(&value));
            0
        }
        Err(e) => exit_error(&format!("Failed to encode result: {e}"), None),
    }
}
