// Throttle - one pending window at a time; requests arriving inside it are dropped
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Throttle {
    delay: Duration,
    pending: bool,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: false,
        }
    }

    /// Opens a window; false when one is already pending
    pub fn try_arm(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    pub fn release(&mut self) {
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_arm_is_dropped_until_release() {
        let mut throttle = Throttle::new(Duration::from_millis(300));
        assert!(throttle.try_arm());
        assert!(throttle.is_pending());
        assert!(!throttle.try_arm());

        throttle.release();
        assert!(!throttle.is_pending());
        assert!(throttle.try_arm());
    }
}
