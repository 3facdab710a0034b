/// Stop segmentation: partition a track into moving and paused runs.
///
/// Two single-pass policies over the cleaned fix buffer, both yielding
/// runs that reconstruct the input exactly when concatenated:
///
/// * `Fast` clusters greedily from the cursor and calls the result a
///   pause only once it already spans the whole trigger window. One
///   clustering pass per run, coarser boundaries.
/// * `Sensitive` (the default) classifies motion one fix at a time and
///   only clusters once a pause is confirmed, catching the onset of a
///   stop near its midpoint at the cost of a lookahead per moving fix.
///
/// An undetermined classification (track ended mid-lookahead) counts as
/// moving: too little evidence to start collapsing points.

use std::ops::Range;

use crate::cluster::stationary_prefix_len;
use crate::config::EngineConfig;
use crate::fix::Fix;
use crate::motion_classifier::{classify, Motion};
use crate::uncertainty::Uncertainty;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Fast,
    Sensitive,
}

/// One classified run. Moves are always single fixes; consecutive moving
/// fixes stay separate entries. Pauses are contiguous, never-empty
/// slices of the cleaned buffer.
#[derive(Debug, PartialEq)]
pub enum Run<'a> {
    Move(&'a Fix),
    Pause(&'a [Fix]),
}

pub struct StopSegments<'a, F> {
    track: &'a [Fix],
    cursor: usize,
    /// Queued single-fix moves from a fast-policy cluster that fell
    /// short of the trigger window.
    pending_moves: Range<usize>,
    policy: Policy,
    uncertainty_fn: F,
    cfg: &'a EngineConfig,
}

/// Lazily partition `track` into runs under the given policy.
/// `uncertainty_fn` should be the detection-threshold variant.
pub fn find_stops<'a, F>(
    track: &'a [Fix],
    policy: Policy,
    uncertainty_fn: F,
    cfg: &'a EngineConfig,
) -> StopSegments<'a, F>
where
    F: Fn(&Fix) -> Uncertainty,
{
    StopSegments {
        track,
        cursor: 0,
        pending_moves: 0..0,
        policy,
        uncertainty_fn,
        cfg,
    }
}

impl<'a, F> StopSegments<'a, F>
where
    F: Fn(&Fix) -> Uncertainty,
{
    fn next_fast(&mut self) -> Option<Run<'a>> {
        let start = self.cursor;
        let len = stationary_prefix_len(&self.track[start..], &self.uncertainty_fn);
        // len >= 1: an empty-seeded cluster always accepts its first candidate
        self.cursor = start + len;
        let span = self.track[self.cursor - 1].time - self.track[start].time;
        if span < self.cfg.trigger_window {
            self.pending_moves = start..self.cursor;
            self.pending_moves
                .next()
                .map(|i| Run::Move(&self.track[i]))
        } else {
            Some(Run::Pause(&self.track[start..self.cursor]))
        }
    }

    fn next_sensitive(&mut self) -> Option<Run<'a>> {
        let current = &self.track[self.cursor];
        let future = &self.track[self.cursor + 1..];
        match classify(current, future, &self.uncertainty_fn, self.cfg) {
            Motion::Moving | Motion::Undetermined => {
                self.cursor += 1;
                Some(Run::Move(current))
            }
            Motion::Paused => {
                let start = self.cursor;
                let len = stationary_prefix_len(&self.track[start..], &self.uncertainty_fn);
                self.cursor = start + len;
                Some(Run::Pause(&self.track[start..self.cursor]))
            }
        }
    }
}

impl<'a, F> Iterator for StopSegments<'a, F>
where
    F: Fn(&Fix) -> Uncertainty,
{
    type Item = Run<'a>;

    fn next(&mut self) -> Option<Run<'a>> {
        if let Some(i) = self.pending_moves.next() {
            return Some(Run::Move(&self.track[i]));
        }
        if self.cursor >= self.track.len() {
            return None;
        }
        match self.policy {
            Policy::Fast => self.next_fast(),
            Policy::Sensitive => self.next_sensitive(),
        }
    }
}
