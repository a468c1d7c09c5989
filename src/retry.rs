/// Bounded attempts with exponential backoff between them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backoff {
    pub max_attempts: u8,
    pub base_ms: u64,
    pub max_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based attempt number
    pub number: u8,
    /// Delay to wait before making this attempt
    pub delay_ms: u64,
}

impl Backoff {
    pub const fn new(max_attempts: u8, base_ms: u64, max_ms: u64) -> Self {
        Self {
            max_attempts,
            base_ms,
            max_ms,
        }
    }

    pub fn attempts(&self) -> Attempts {
        Attempts {
            backoff: *self,
            made: 0,
        }
    }

    /// Delay before attempt `number`. The first attempt doesn't wait, then
    /// `base_ms` doubles for each further attempt, capped at `max_ms`.
    pub fn delay_before(&self, number: u8) -> u64 {
        if number <= 1 {
            return 0;
        }
        let exponent = u32::from(number - 2);
        let factor = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
        self.base_ms.saturating_mul(factor).min(self.max_ms)
    }
}

#[derive(Debug)]
pub struct Attempts {
    backoff: Backoff,
    made: u8,
}

impl Attempts {
    pub fn made(&self) -> u8 {
        self.made
    }

    pub fn exhausted(&self) -> bool {
        self.made >= self.backoff.max_attempts
    }
}

impl Iterator for Attempts {
    type Item = Attempt;

    fn next(&mut self) -> Option<Attempt> {
        if self.exhausted() {
            return None;
        }
        self.made += 1;
        Some(Attempt {
            number: self.made,
            delay_ms: self.backoff.delay_before(self.made),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_at_most_max_attempts() {
        let backoff = Backoff::new(10, 500, 8_000);
        let mut attempts = backoff.attempts();
        assert_eq!(attempts.by_ref().count(), 10);
        assert!(attempts.exhausted());
        assert_eq!(attempts.next(), None);
        assert_eq!(attempts.made(), 10);
    }

    #[test]
    fn delays_double_then_cap() {
        let backoff = Backoff::new(8, 500, 8_000);
        let delays: Vec<u64> = backoff.attempts().map(|a| a.delay_ms).collect();
        assert_eq!(
            delays,
            [0, 500, 1_000, 2_000, 4_000, 8_000, 8_000, 8_000]
        );
    }

    #[test]
    fn attempt_numbers_are_one_based() {
        let numbers: Vec<u8> = Backoff::new(3, 100, 100)
            .attempts()
            .map(|a| a.number)
            .collect();
        assert_eq!(numbers, [1, 2, 3]);
    }

    #[test]
    fn large_attempt_numbers_saturate() {
        let backoff = Backoff::new(u8::MAX, 500, 8_000);
        assert_eq!(backoff.delay_before(u8::MAX), 8_000);
    }

    #[test]
    fn zero_attempts_never_tries() {
        assert_eq!(Backoff::new(0, 500, 8_000).attempts().next(), None);
    }
}
