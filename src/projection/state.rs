//! Portfolio state tracking for a single retirement cohort

/// State of one cohort's portfolio during simulation
#[derive(Debug, Clone)]
pub struct PortfolioState {
    /// Nominal balance; never negative
    pub balance: f64,

    /// Years simulated so far (0 before the first year runs)
    pub year_index: u32,

    /// Whether the balance has hit zero
    pub depleted: bool,

    /// Calendar year in which the balance hit zero
    pub depletion_year: Option<i32>,

    /// Withdrawal taken in the previous simulated year
    pub prior_withdrawal: Option<f64>,

    /// Cumulative price level relative to retirement start
    pub inflation_factor: f64,

    /// Year index at which the glide path last (re)started
    pub glide_origin: u32,

    /// Nominal spending level set by the most recent raise (flat withdrawals)
    pub raised_withdrawal: Option<f64>,

    /// Number of spending raises so far
    pub raises: u32,

    /// Nominal amount actually paid out so far
    pub total_withdrawn: f64,
}

impl PortfolioState {
    /// Fresh state at retirement
    pub fn new(initial_balance: f64) -> Self {
        Self {
            balance: initial_balance,
            year_index: 0,
            depleted: false,
            depletion_year: None,
            prior_withdrawal: None,
            inflation_factor: 1.0,
            glide_origin: 0,
            raised_withdrawal: None,
            raises: 0,
            total_withdrawn: 0.0,
        }
    }

    /// Years since retirement or the last spending raise, whichever is later
    pub fn glide_years(&self) -> u32 {
        self.year_index.saturating_sub(self.glide_origin)
    }

    /// Compound the balance by one year's portfolio return
    pub fn apply_growth(&mut self, portfolio_return: f64) {
        if !self.depleted {
            self.balance *= 1.0 + portfolio_return;
        }
    }

    /// Take a withdrawal; the balance may go non-positive until `settle` runs
    pub fn withdraw(&mut self, amount: f64) {
        if !self.depleted {
            self.total_withdrawn += amount.min(self.balance.max(0.0));
            self.balance -= amount;
            self.prior_withdrawal = Some(amount);
        }
    }

    /// Clamp a non-positive balance to zero and record depletion once
    pub fn settle(&mut self, calendar_year: i32) {
        if self.balance <= 0.0 {
            self.balance = 0.0;
            if !self.depleted {
                self.depleted = true;
                self.depletion_year = Some(calendar_year);
            }
        }
    }

    /// Raise spending to `level` and restart the glide path next year
    pub fn raise_spending(&mut self, level: f64, inflation_adjusted: bool) {
        if inflation_adjusted {
            self.prior_withdrawal = Some(level);
        } else {
            self.raised_withdrawal = Some(level);
        }
        self.raises += 1;
        self.glide_origin = self.year_index + 1;
    }

    /// Close out the year: accumulate inflation and move to the next year
    pub fn advance_year(&mut self, inflation: f64) {
        self.inflation_factor *= 1.0 + inflation;
        self.year_index += 1;
    }

    /// Balance in retirement-start dollars
    pub fn real_balance(&self) -> f64 {
        self.balance / self.inflation_factor
    }
}
