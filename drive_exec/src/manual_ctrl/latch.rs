//! Heading latch

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::Serialize;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Remembers an absolute heading request until the operator rotates
/// manually.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum HeadingLatch {
    /// Rotation follows the operator's input.
    Free,

    /// Rotation is servoed to this heading.
    ///
    /// Units: radians
    Latched(f64),
}

impl Default for HeadingLatch {
    fn default() -> Self {
        HeadingLatch::Free
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HeadingLatch {
    /// Update the latch and return the latched heading, if any.
    ///
    /// Rotation input outside the deadband always releases the latch. Without
    /// rotation input a heading request latches (replacing any previous one),
    /// and with neither the latch is unchanged.
    pub fn update(
        &mut self,
        request_rad: Option<f64>,
        rotation_input_rads: f64,
        deadband_rads: f64,
    ) -> Option<f64> {
        if rotation_input_rads.abs() > deadband_rads {
            if let HeadingLatch::Latched(_) = self {
                debug!("Heading latch released by rotation input");
            }
            *self = HeadingLatch::Free;
            return None;
        }

        if let Some(heading) = request_rad {
            if *self != HeadingLatch::Latched(heading) {
                debug!("Heading latched to {:.3} rad", heading);
            }
            *self = HeadingLatch::Latched(heading);
        }

        self.target()
    }

    pub fn unlatch(&mut self) {
        *self = HeadingLatch::Free;
    }

    pub fn target(&self) -> Option<f64> {
        match self {
            HeadingLatch::Free => None,
            HeadingLatch::Latched(h) => Some(*h),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_transitions() {
        let mut latch = HeadingLatch::default();
        assert_eq!(latch.update(None, 0.0, 0.05), None);

        // Request with no rotation latches, and stays latched without input
        assert_eq!(latch.update(Some(1.0), 0.0, 0.05), Some(1.0));
        assert_eq!(latch.update(None, 0.01, 0.05), Some(1.0));
        assert_eq!(latch, HeadingLatch::Latched(1.0));

        // Rotation releases and forgets the heading
        assert_eq!(latch.update(None, 0.5, 0.05), None);
        assert_eq!(latch.update(None, 0.0, 0.05), None);

        // Rotation wins over a request
        assert_eq!(latch.update(Some(2.0), -0.5, 0.05), None);

        latch.update(Some(2.0), 0.0, 0.05);
        latch.unlatch();
        assert_eq!(latch, HeadingLatch::Free);
    }
}
