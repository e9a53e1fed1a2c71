use serde::{Deserialize, Serialize};

use crate::types::PrizePosition;

/// Share of the total investment reserved for each prize position, in percent.
pub const PRIZE_PERCENTAGES: [i64; 3] = [10, 3, 1];

/// Prize pool of a round in minor currency units.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrizeFund {
    pub first: i64,
    pub second: i64,
    pub third: i64,
}

impl PrizeFund {
    pub fn total(&self) -> i64 {
        self.first + self.second + self.third
    }

    pub fn amount_for(&self, position: PrizePosition) -> i64 {
        match position {
            PrizePosition::First => self.first,
            PrizePosition::Second => self.second,
            PrizePosition::Third => self.third,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrizePercentages {
    pub first_place: i64,
    pub second_place: i64,
    pub third_place: i64,
    pub total: i64,
}

pub fn prize_percentages() -> PrizePercentages {
    let [first_place, second_place, third_place] = PRIZE_PERCENTAGES;
    PrizePercentages {
        first_place,
        second_place,
        third_place,
        total: PRIZE_PERCENTAGES.iter().sum(),
    }
}

/// Derive the prize pool from a total investment. Each share truncates toward
/// zero independently so repeated recomputation never drifts.
pub fn compute_fund(total_investment: i64) -> PrizeFund {
    let share = |pct: i64| ((total_investment as i128 * pct as i128) / 100) as i64;
    PrizeFund {
        first: share(PRIZE_PERCENTAGES[0]),
        second: share(PRIZE_PERCENTAGES[1]),
        third: share(PRIZE_PERCENTAGES[2]),
    }
}
