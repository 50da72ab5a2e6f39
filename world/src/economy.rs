//! Gold ledger owned by the world.

/// Gold balance that never goes negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ledger {
    balance: u64,
}

impl Ledger {
    /// Creates a ledger holding `balance` gold.
    #[must_use]
    pub const fn new(balance: u64) -> Self {
        Self { balance }
    }

    /// Current balance.
    #[must_use]
    pub const fn balance(&self) -> u64 {
        self.balance
    }

    /// Deducts `amount` when the balance covers it.
    ///
    /// Zero amounts are refused and leave the balance untouched.
    #[must_use]
    pub fn spend(&mut self, amount: u64) -> bool {
        if amount == 0 || amount > self.balance {
            return false;
        }
        self.balance -= amount;
        true
    }

    /// Adds `amount` to the balance. Zero is a no-op.
    pub fn credit(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }
}
