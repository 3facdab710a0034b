/// Stream splicing: substitute collapsed pauses back into the track.
///
/// One forward pass over the base sequence with a cursor and one pending
/// (pause run, replacement) pair at a time. When the current base fix
/// equals the pending run's first fix, the replacement is emitted in its
/// place and the cursor jumps past the run; everything else passes
/// through untouched. Matching is exact structural equality, so the runs
/// must come from the very sequence being walked. A pending run whose
/// first fix never shows up is silently never substituted and the rest
/// of the base passes through; callers accept that degradation rather
/// than aborting a mostly-good track.

use crate::fix::Fix;

pub struct Splice<'a, I>
where
    I: Iterator<Item = (&'a [Fix], Vec<Fix>)>,
{
    base: &'a [Fix],
    cursor: usize,
    pending: Option<(&'a [Fix], Vec<Fix>)>,
    replacements: I,
    emitting: std::vec::IntoIter<Fix>,
}

/// Lazily rebuild the output sequence from `base` and the pause-run
/// replacements, which must arrive in base order.
pub fn splice<'a, I>(base: &'a [Fix], replacements: I) -> Splice<'a, I::IntoIter>
where
    I: IntoIterator<Item = (&'a [Fix], Vec<Fix>)>,
{
    let mut replacements = replacements.into_iter();
    let pending = replacements.next();
    Splice {
        base,
        cursor: 0,
        pending,
        replacements,
        emitting: Vec::new().into_iter(),
    }
}

impl<'a, I> Iterator for Splice<'a, I>
where
    I: Iterator<Item = (&'a [Fix], Vec<Fix>)>,
{
    type Item = Fix;

    fn next(&mut self) -> Option<Fix> {
        loop {
            if let Some(fix) = self.emitting.next() {
                return Some(fix);
            }
            let current = self.base.get(self.cursor)?;
            let matches = match &self.pending {
                Some((run, _)) => run.first() == Some(current),
                None => false,
            };
            if matches {
                if let Some((run, replacement)) = self.pending.take() {
                    self.cursor += run.len();
                    self.pending = self.replacements.next();
                    self.emitting = replacement.into_iter();
                }
                continue;
            }
            self.cursor += 1;
            return Some(current.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn fix(lat: f64, seconds: i64) -> Fix {
        Fix {
            latitude: lat,
            longitude: -74.0,
            elevation: None,
            time: Utc.with_ymd_and_hms(2021, 3, 14, 12, 0, 0).unwrap() + Duration::seconds(seconds),
            hdop_cm: Some(500.0),
            vdop_cm: None,
        }
    }

    #[test]
    fn test_no_pauses_pass_through_unchanged() {
        let base = vec![fix(40.0, 0), fix(40.01, 5), fix(40.02, 10)];
        let out: Vec<Fix> = splice(&base, Vec::new()).collect();
        assert_eq!(out, base);
    }

    #[test]
    fn test_pause_run_replaced_by_centroid() {
        let base = vec![
            fix(40.0, 0),
            fix(40.01, 5),
            fix(40.0101, 10),
            fix(40.0099, 15),
            fix(40.02, 20),
        ];
        let centroid = fix(40.01, 10);
        let pairs = vec![(&base[1..4], vec![centroid.clone()])];
        let out: Vec<Fix> = splice(&base, pairs).collect();
        assert_eq!(out, vec![base[0].clone(), centroid, base[4].clone()]);
    }

    #[test]
    fn test_consecutive_runs_and_tail() {
        let base: Vec<Fix> = (0..6).map(|i| fix(40.0 + i as f64 * 0.01, i * 5)).collect();
        let c1 = fix(41.0, 2);
        let c2 = fix(42.0, 17);
        let pairs = vec![
            (&base[0..2], vec![c1.clone()]),
            (&base[2..5], vec![c2.clone()]),
        ];
        let out: Vec<Fix> = splice(&base, pairs).collect();
        assert_eq!(out, vec![c1, c2, base[5].clone()]);
    }

    #[test]
    fn test_unmatched_run_degrades_to_pass_through() {
        let base = vec![fix(40.0, 0), fix(40.01, 5), fix(40.02, 10)];
        // A run whose first fix is not in the base sequence at all
        let stray = vec![fix(50.0, 100)];
        let pairs = vec![(&stray[..], vec![fix(51.0, 100)])];
        let out: Vec<Fix> = splice(&base, pairs).collect();
        assert_eq!(out, base);
    }

    #[test]
    fn test_replacement_may_hold_several_centroids() {
        let base = vec![fix(40.0, 0), fix(40.0001, 65), fix(40.0002, 130), fix(41.0, 140)];
        let c1 = fix(40.0, 0);
        let c2 = fix(40.0001, 65);
        let c3 = fix(40.0002, 130);
        let pairs = vec![(&base[0..3], vec![c1.clone(), c2.clone(), c3.clone()])];
        let out: Vec<Fix> = splice(&base, pairs).collect();
        assert_eq!(out, vec![c1, c2, c3, base[3].clone()]);
    }
}
