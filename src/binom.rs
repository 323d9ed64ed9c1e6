use crate::error::AppError;

pub const DEFAULT_PLAYER_LABEL: &str = "Player";

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisInput {
    pub xg_total: f64,
    pub shot_count: u32,
    pub observed_goals: u32,
    pub player_label: String,
}

impl AnalysisInput {
    pub fn new(xg_total: f64, shot_count: u32, observed_goals: u32, player_label: &str) -> Self {
        let label = player_label.trim();
        Self {
            xg_total,
            shot_count,
            observed_goals,
            player_label: if label.is_empty() {
                DEFAULT_PLAYER_LABEL.to_string()
            } else {
                label.to_string()
            },
        }
    }
}

/// Goal distribution for one analysis. `pmf` covers the charted support
/// `0..=max_goals`; `cdf` always covers the full `0..=shot_count`.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub scoring_probability: f64,
    pub max_goals: u32,
    pub pmf: Vec<f64>,
    pub cdf: Vec<f64>,
    pub prob_at_least_observed: f64,
}

impl Distribution {
    pub fn support(&self) -> impl Iterator<Item = u32> + '_ {
        0..=self.max_goals
    }

    pub fn shot_count(&self) -> u32 {
        self.cdf.len().saturating_sub(1) as u32
    }
}

pub fn compute_distribution(input: &AnalysisInput) -> Result<Distribution, AppError> {
    validate(input)?;

    let n = input.shot_count;
    let p = scoring_probability(input.xg_total, n);
    let full = binomial_pmf(n, p);
    let max_goals = max_goals(input.xg_total, n);

    let pmf = full[..=max_goals as usize].to_vec();
    let cdf = cumulative(&full);
    let prob_at_least_observed = clamp(1.0 - cdf[input.observed_goals as usize], 0.0, 1.0);

    Ok(Distribution {
        scoring_probability: p,
        max_goals,
        pmf,
        cdf,
        prob_at_least_observed,
    })
}

fn validate(input: &AnalysisInput) -> Result<(), AppError> {
    if !input.xg_total.is_finite() || input.xg_total <= 0.0 {
        return Err(AppError::Validation("xG total must be greater than zero"));
    }
    if input.shot_count == 0 {
        return Err(AppError::Validation("shot count must be greater than zero"));
    }
    if input.observed_goals > input.shot_count {
        return Err(AppError::Validation("goals cannot exceed shots"));
    }
    // p = xg / shots would leave [0, 1].
    if input.xg_total > input.shot_count as f64 {
        return Err(AppError::Validation("xG total cannot exceed shots"));
    }
    Ok(())
}

pub fn scoring_probability(xg_total: f64, shot_count: u32) -> f64 {
    xg_total / shot_count as f64
}

/// Upper end of the charted support: twice the whole-goal xG, capped at the
/// shot count. A zero bound (xG below one goal) widens to every shot.
pub fn max_goals(xg_total: f64, shot_count: u32) -> u32 {
    let doubled = (xg_total.max(0.0).floor() as u32).saturating_mul(2);
    match doubled.min(shot_count) {
        0 => shot_count,
        bound => bound,
    }
}

/// Binomial PMF for every k in `0..=n`, evaluated in log space.
pub fn binomial_pmf(n: u32, p: f64) -> Vec<f64> {
    let n = n as usize;
    let mut out = vec![0.0; n + 1];

    if p <= 0.0 {
        out[0] = 1.0;
        return out;
    }
    if p >= 1.0 {
        out[n] = 1.0;
        return out;
    }

    let ln_fact = log_factorials(n);
    let ln_p = p.ln();
    let ln_q = (-p).ln_1p();
    for (k, slot) in out.iter_mut().enumerate() {
        let ln_choose = ln_fact[n] - ln_fact[k] - ln_fact[n - k];
        *slot = (ln_choose + k as f64 * ln_p + (n - k) as f64 * ln_q).exp();
    }
    out
}

fn log_factorials(n: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(n + 1);
    let mut acc = 0.0_f64;
    out.push(acc);
    for i in 1..=n {
        acc += (i as f64).ln();
        out.push(acc);
    }
    out
}

fn cumulative(pmf: &[f64]) -> Vec<f64> {
    let mut acc = 0.0;
    pmf.iter()
        .map(|p| {
            acc += p;
            // Guard against tiny float drift past 1.
            acc.min(1.0)
        })
        .collect()
}

pub fn format_title(player_label: &str, observed_goals: u32, prob_at_least: f64) -> String {
    format!(
        "{player_label}\nProb ≥ {observed_goals}: {:.2}%",
        prob_at_least * 100.0
    )
}

fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(xg: f64, shots: u32, goals: u32) -> AnalysisInput {
        AnalysisInput::new(xg, shots, goals, "Test")
    }

    #[test]
    fn default_scenario_matches_reference_values() {
        let dist = compute_distribution(&input(5.0, 20, 3)).unwrap();
        assert!((dist.scoring_probability - 0.25).abs() < 1e-12);
        assert_eq!(dist.max_goals, 10);
        assert_eq!(dist.pmf.len(), 11);
        assert_eq!(dist.cdf.len(), 21);
        assert!((dist.prob_at_least_observed - 0.7748).abs() < 1e-4);
        assert!((dist.prob_at_least_observed - (1.0 - dist.cdf[3])).abs() < 1e-12);
    }

    #[test]
    fn pmf_matches_closed_form_for_small_n() {
        let pmf = binomial_pmf(4, 0.5);
        let expected = [1.0, 4.0, 6.0, 4.0, 1.0].map(|c| c / 16.0);
        for (got, want) in pmf.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn full_pmf_sums_to_one() {
        for (shots, xg) in [(1, 0.3), (20, 5.0), (100, 17.4), (37, 37.0), (2_000, 150.0)] {
            let total: f64 = binomial_pmf(shots, xg / shots as f64).iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "shots={shots} xg={xg} total={total}");
        }
    }

    #[test]
    fn large_shot_counts_stay_finite() {
        let pmf = binomial_pmf(50_000, 0.1);
        assert!(pmf.iter().all(|p| p.is_finite() && *p >= 0.0));
        let mode = pmf
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(mode, 5_000);
    }

    #[test]
    fn cdf_is_non_decreasing_and_ends_at_one() {
        let dist = compute_distribution(&input(7.3, 40, 0)).unwrap();
        for pair in dist.cdf.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        assert!((dist.cdf[40] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn prob_at_least_is_non_increasing_in_goals() {
        let mut prev = f64::INFINITY;
        for goals in 0..=30 {
            let dist = compute_distribution(&input(9.5, 30, goals)).unwrap();
            assert!(dist.prob_at_least_observed <= prev + 1e-12);
            prev = dist.prob_at_least_observed;
        }
    }

    #[test]
    fn max_goals_stays_within_one_and_shot_count() {
        for shots in 1..=100 {
            for tenth in 1..=200 {
                let xg = tenth as f64 / 10.0;
                let m = max_goals(xg, shots);
                assert!((1..=shots).contains(&m), "xg={xg} shots={shots} max={m}");
            }
        }
    }

    #[test]
    fn max_goals_widens_to_all_shots_below_one_expected_goal() {
        assert_eq!(max_goals(0.4, 20), 20);
        assert_eq!(max_goals(0.5, 20), 20);
        assert_eq!(max_goals(0.9, 20), 20);
        assert_eq!(max_goals(1.0, 20), 2);
        assert_eq!(max_goals(1.0, 1), 1);
        assert_eq!(max_goals(12.7, 20), 20);
    }

    #[test]
    fn rejects_non_positive_xg() {
        assert!(matches!(
            compute_distribution(&input(0.0, 20, 3)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            compute_distribution(&input(-1.0, 20, 3)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            compute_distribution(&input(f64::NAN, 20, 3)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_zero_shots_and_goals_above_shots() {
        assert!(matches!(
            compute_distribution(&input(1.0, 0, 0)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            compute_distribution(&input(5.0, 10, 15)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_xg_above_shots_but_accepts_equal() {
        assert!(matches!(
            compute_distribution(&input(5.1, 5, 1)),
            Err(AppError::Validation(_))
        ));

        let dist = compute_distribution(&input(5.0, 5, 5)).unwrap();
        assert!((dist.scoring_probability - 1.0).abs() < 1e-12);
        assert!((dist.cdf[4]).abs() < 1e-12);
        assert!((dist.cdf[5] - 1.0).abs() < 1e-12);
        assert_eq!(dist.prob_at_least_observed, 0.0);
    }

    #[test]
    fn blank_label_falls_back_to_default() {
        assert_eq!(AnalysisInput::new(1.0, 2, 0, "   ").player_label, "Player");
        assert_eq!(AnalysisInput::new(1.0, 2, 0, " Kane ").player_label, "Kane");
    }

    #[test]
    fn title_carries_label_and_percentage() {
        assert_eq!(format_title("Kane", 3, 0.774_84), "Kane\nProb ≥ 3: 77.48%");
    }
}
