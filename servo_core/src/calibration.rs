//! Two-point range calibration math.
//!
//! Feedback at the pulse extremes is never measured directly. Each border is
//! extrapolated along the line through the zero point and one short excursion,
//! which only holds while the pot is linear around the sampled region.

/// One (pulse, feedback) observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub pulse: u16,
    pub feedback: u16,
}

/// Feedback readings fitted for `pulse_min` and `pulse_max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackRange {
    pub min: u16,
    pub max: u16,
}

/// Feedback expected at pulse `target`, extrapolated from `zero` through `sample`:
///
/// `f0 + (f1 - f0) * (target - p0) / (p1 - p0)`
///
/// Computed in `i64` so the product cannot overflow. Returns `None` when the
/// two samples share a pulse width.
pub fn extrapolate_border(zero: Sample, sample: Sample, target: u16) -> Option<i64> {
    let p0 = i64::from(zero.pulse);
    let p1 = i64::from(sample.pulse);
    let f0 = i64::from(zero.feedback);
    let f1 = i64::from(sample.feedback);
    let dp = p1 - p0;
    if dp == 0 {
        return None;
    }
    Some(f0 + (f1 - f0) * (i64::from(target) - p0) / dp)
}

/// Fit both borders and check that the result is usable.
///
/// Rejected when an excursion did not move the pulse, when a border falls
/// outside the `u16` reading domain, or when the borders are not on opposite
/// sides of the zero reading.
pub fn fit_range(
    zero: Sample,
    toward_min: Sample,
    toward_max: Sample,
    pulse_min: u16,
    pulse_max: u16,
) -> Result<FeedbackRange, &'static str> {
    let lo = extrapolate_border(zero, toward_min, pulse_min)
        .ok_or("excursion produced no pulse change")?;
    let hi = extrapolate_border(zero, toward_max, pulse_max)
        .ok_or("excursion produced no pulse change")?;

    let domain = 0..=i64::from(u16::MAX);
    if !domain.contains(&lo) || !domain.contains(&hi) {
        return Err("extrapolated border outside the feedback domain");
    }

    let f0 = i64::from(zero.feedback);
    if (lo - f0).signum() * (hi - f0).signum() != -1 {
        return Err("borders are not on opposite sides of the zero reading");
    }

    Ok(FeedbackRange {
        min: lo as u16,
        max: hi as u16,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(pulse: u16, feedback: u16) -> Sample {
        Sample { pulse, feedback }
    }

    #[test]
    fn exact_on_linear_data() {
        // f = (p - 500) / 2
        let zero = s(1500, 500);
        assert_eq!(extrapolate_border(zero, s(1148, 324), 500), Some(0));
        assert_eq!(extrapolate_border(zero, s(1852, 676), 2500), Some(1000));
    }

    #[test]
    fn wide_products_do_not_overflow() {
        let zero = s(30_000, 30_000);
        let far = extrapolate_border(zero, s(30_001, 65_000), 65_000);
        assert_eq!(far, Some(30_000 + 35_000 * 35_000));
    }

    #[test]
    fn degenerate_excursion_is_rejected() {
        let zero = s(1500, 511);
        assert_eq!(extrapolate_border(zero, s(1500, 600), 500), None);
        assert_eq!(
            fit_range(zero, s(1500, 511), s(1852, 691), 500, 2500),
            Err("excursion produced no pulse change")
        );
    }

    #[test]
    fn inverted_pot_still_fits() {
        // feedback falls as pulse rises
        let zero = s(1500, 600);
        let r = fit_range(zero, s(1148, 776), s(1852, 424), 500, 2500).unwrap();
        assert_eq!(r, FeedbackRange { min: 1100, max: 100 });
    }

    #[test]
    fn flat_feedback_is_rejected() {
        let zero = s(1500, 511);
        let err = fit_range(zero, s(1148, 511), s(1852, 511), 500, 2500).unwrap_err();
        assert!(err.contains("opposite sides"));
    }

    #[test]
    fn out_of_domain_border_is_rejected() {
        let zero = s(1500, 100);
        // steep slope drives the low border far below zero
        let err = fit_range(zero, s(1400, 50), s(1600, 150), 500, 2500).unwrap_err();
        assert!(err.contains("outside"));
    }
}
