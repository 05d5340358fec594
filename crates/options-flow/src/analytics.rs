/// Which side of the chain a strike suggestion is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSide {
    Call,
    Put,
}

/// Settlement price that maximizes aggregate intrinsic payout across
/// the chain. Returns `None` when the inputs are empty or the OI
/// arrays do not line up with the strikes.
pub fn calculate_max_pain(strikes: &[f64], call_oi: &[f64], put_oi: &[f64]) -> Option<f64> {
    if strikes.is_empty() || call_oi.len() != strikes.len() || put_oi.len() != strikes.len() {
        return None;
    }

    let mut best_strike = strikes[0];
    let mut best_pain = 0.0_f64;

    for &candidate in strikes {
        let mut pain = 0.0;
        for (i, &strike) in strikes.iter().enumerate() {
            if strike < candidate {
                pain += call_oi[i] * (candidate - strike);
            } else if strike > candidate {
                pain += put_oi[i] * (strike - candidate);
            }
        }
        if pain > best_pain {
            best_pain = pain;
            best_strike = candidate;
        }
    }

    Some(best_strike)
}

/// Strike to trade given current volatility. Rich IV favors going one
/// step out of the money; otherwise stay at the money.
pub fn suggest_optimal_strike(spot: f64, side: OptionSide, iv_percentile: f64) -> f64 {
    let step = strike_step(spot);
    let atm = (spot / step).round() * step;

    if iv_percentile > 60.0 {
        match side {
            OptionSide::Call => atm + step,
            OptionSide::Put => atm - step,
        }
    } else {
        atm
    }
}

fn strike_step(spot: f64) -> f64 {
    if spot < 30_000.0 {
        50.0
    } else {
        100.0
    }
}
