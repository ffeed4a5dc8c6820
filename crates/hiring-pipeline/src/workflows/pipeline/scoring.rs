use serde::Serialize;

use super::domain::Interview;

/// Mean of the scored interviews of one application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateScore {
    /// Unrounded arithmetic mean.
    pub mean: f64,
    /// Number of interviews that carried a score.
    pub scored: usize,
}

impl AggregateScore {
    /// Mean rounded half away from zero to two decimals, for display.
    pub fn rounded(&self) -> f64 {
        (self.mean * 100.0).round() / 100.0
    }
}

/// Average the present scores. `None` when nothing has been scored yet, whether the
/// application has no interviews at all or only unscored ones.
pub fn aggregate_scores<'a, I>(interviews: I) -> Option<AggregateScore>
where
    I: IntoIterator<Item = &'a Interview>,
{
    let (sum, scored) = interviews
        .into_iter()
        .filter_map(|interview| interview.score)
        .filter(|score| score.is_finite())
        .fold((0.0_f64, 0_usize), |(sum, count), score| {
            (sum + score, count + 1)
        });

    if scored == 0 {
        return None;
    }

    Some(AggregateScore {
        mean: sum / scored as f64,
        scored,
    })
}
