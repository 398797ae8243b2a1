//! Bus cycle counts.

/// A count of emulated bus cycles.
///
/// Used both for durations (how far to advance a component) and for
/// timestamps (the cycle at which a component was last synchronised).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(pub u64);

impl Ticks {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Cycles elapsed since `earlier`. Saturates at zero if `earlier` is
    /// in the future.
    #[must_use]
    pub const fn since(self, earlier: Self) -> Self {
        Self(self.0.saturating_sub(earlier.0))
    }
}

impl core::ops::Add for Ticks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl core::ops::AddAssign for Ticks {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl core::ops::Sub for Ticks {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl From<u64> for Ticks {
    fn from(count: u64) -> Self {
        Self(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_saturates() {
        assert_eq!(Ticks::new(10).since(Ticks::new(4)), Ticks::new(6));
        assert_eq!(Ticks::new(4).since(Ticks::new(10)), Ticks::ZERO);
    }

    #[test]
    fn add_assign_accumulates() {
        let mut t = Ticks::ZERO;
        t += Ticks::new(3);
        t += 5.into();
        assert_eq!(t.get(), 8);
    }
}
