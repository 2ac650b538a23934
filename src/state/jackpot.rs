use rand::Rng;
use serde::Deserialize;

/// Tunables of the jackpot economy, loaded from the application config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JackpotSettings {
    /// Amount the pool starts with and is refilled to after a payout.
    pub initial_amount: u64,
    /// Payout chance (percent) the pool starts with and resets to after a payout.
    pub initial_payout_chance: u32,
    /// Points added to the pool for every incorrect answer.
    pub wrong_answer_bonus: u64,
    /// Payout chance added for every incorrect answer.
    pub payout_chance_increment: u32,
}

impl Default for JackpotSettings {
    fn default() -> Self {
        Self {
            initial_amount: 1000,
            initial_payout_chance: 10,
            wrong_answer_bonus: 200,
            payout_chance_increment: 1,
        }
    }
}

/// Shared bonus pool attached to one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jackpot {
    settings: JackpotSettings,
    amount: u64,
    active: bool,
    payout_chance: u32,
    payout_counter: u32,
}

impl Jackpot {
    /// Inactive pool filled with the initial amount.
    pub fn new(settings: JackpotSettings) -> Self {
        Self {
            settings,
            amount: settings.initial_amount,
            active: false,
            payout_chance: settings.initial_payout_chance,
            payout_counter: 0,
        }
    }

    /// Points currently in the pool.
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Whether a jackpot-flagged correct answer pays out.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current activation chance in percent.
    pub fn payout_chance(&self) -> u32 {
        self.payout_chance
    }

    /// Lifetime number of payouts for the owning match.
    pub fn payout_counter(&self) -> u32 {
        self.payout_counter
    }

    /// Force the activation state, as on the last question.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Draw from `1..=101` and activate when the draw reaches `100 - payout_chance`.
    ///
    /// The range is one wider than a percentage: at the initial 10% chance,
    /// 12 of the 101 possible draws activate the pool.
    /// An already active jackpot stays active whatever the draw.
    pub fn random_activation<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let draw = rng.random_range(0..=100) + 1;
        self.activate_on_draw(draw)
    }

    /// Deterministic half of [`Jackpot::random_activation`].
    pub fn activate_on_draw(&mut self, draw: u32) -> bool {
        let threshold = 100u32.saturating_sub(self.payout_chance);
        if draw >= threshold {
            self.active = true;
        }
        self.active
    }

    /// Raise the payout chance; no upper clamp.
    pub fn increase_payout_chance(&mut self, delta: u32) {
        self.payout_chance = self.payout_chance.saturating_add(delta);
    }

    /// Grow the pool.
    pub fn add_points(&mut self, points: u64) {
        self.amount = self.amount.saturating_add(points);
    }

    /// Apply the configured penalty for an incorrect answer.
    pub fn record_wrong_answer(&mut self) {
        self.increase_payout_chance(self.settings.payout_chance_increment);
        self.add_points(self.settings.wrong_answer_bonus);
    }

    /// Empty and deactivate the pool, refill it, reset the odds and count the payout.
    ///
    /// Returns the amount that was in the pool before the reset.
    pub fn payout(&mut self) -> u64 {
        let paid = std::mem::take(&mut self.amount);
        self.active = false;
        self.amount = self.settings.initial_amount;
        self.payout_chance = self.settings.initial_payout_chance;
        self.payout_counter = self.payout_counter.saturating_add(1);
        paid
    }
}
