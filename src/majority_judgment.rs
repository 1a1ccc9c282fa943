//! Majority judgment ranking.
//!
//! Each candidate is summarised by a [`MeritProfile`]: how many votes it received at each grade
//! value. Candidates are ranked by their majority grade, the lower median of their grades. Ties
//! are broken by repeatedly removing one vote at the shared majority grade from both candidates
//! and comparing again; a candidate that runs out of votes first loses.
//!
//! Removing the majority grade over and over yields a candidate's *majority values*. Comparing
//! two candidates as above is the same as comparing their majority values lexicographically,
//! where a proper prefix ranks lower. See [`majority_values`].

use std::cmp::Ordering;
use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::common::election::GradeValue;

/// Number of votes.
pub type Count = u64;

/// Grade value to the number of votes at that grade. Zero counts are allowed.
pub type MeritProfile = BTreeMap<GradeValue, Count>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankingError {
    #[error("No votes were recorded")]
    NoRecordedVotes,
    #[error("Candidate at position {0} has no votes while others do")]
    EmptyProfile(usize),
}

/// Total number of votes in a profile.
pub fn total_votes(profile: &MeritProfile) -> Count {
    profile.values().sum()
}

/// The lower median grade of a profile, or `None` if it has no votes.
///
/// Counts are accumulated from the highest grade down; the majority grade is the first one at
/// which more than half of the votes have been seen.
pub fn majority_grade(profile: &MeritProfile) -> Option<GradeValue> {
    majority_run(profile).map(|(grade, _)| grade)
}

/// The majority grade, along with how many times in a row it would stay the majority grade if
/// one vote at that grade were removed each time.
fn majority_run(profile: &MeritProfile) -> Option<(GradeValue, Count)> {
    let total = total_votes(profile);
    let mut above = 0;
    for (&grade, &count) in profile.iter().rev() {
        if (above + count) * 2 > total {
            // After removing k votes at `grade`, it is still the majority grade while both
            // 2 * above <= total - k and 2 * (above + count - k) > total - k.
            let keep_upper_half = total - 2 * above;
            let keep_lower_half = 2 * (above + count) - total - 1;
            return Some((grade, keep_upper_half.min(keep_lower_half) + 1));
        }
        above += count;
    }
    None
}

fn remove_votes(profile: &mut MeritProfile, grade: GradeValue, count: Count) {
    if let Some(remaining) = profile.get_mut(&grade) {
        *remaining = remaining.saturating_sub(count);
        if *remaining == 0 {
            profile.remove(&grade);
        }
    }
}

/// Compare two candidates. `Greater` means `a` ranks better than `b`.
pub fn compare(a: &MeritProfile, b: &MeritProfile) -> Ordering {
    let mut a = a.clone();
    let mut b = b.clone();
    loop {
        match (majority_run(&a), majority_run(&b)) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some((grade_a, _)), Some((grade_b, _))) if grade_a != grade_b => {
                return grade_a.cmp(&grade_b)
            }
            (Some((grade, run_a)), Some((_, run_b))) => {
                // Remove as many shared majority votes at once as keeps the grade unchanged.
                let removed = run_a.min(run_b);
                remove_votes(&mut a, grade, removed);
                remove_votes(&mut b, grade, removed);
            }
        }
    }
}

/// The sequence of majority grades obtained by removing one majority vote at a time.
///
/// Its length is always the total number of votes.
pub fn majority_values(profile: &MeritProfile) -> Vec<GradeValue> {
    let mut profile = profile.clone();
    let mut values = Vec::with_capacity(total_votes(&profile) as usize);
    while let Some(grade) = majority_grade(&profile) {
        values.push(grade);
        remove_votes(&mut profile, grade, 1);
    }
    values
}

/// Rank candidates, best first.
///
/// Candidates that compare equal keep their input order, so the result is always a strict
/// order. Every candidate must have at least one vote.
pub fn rank<K>(profiles: Vec<(K, MeritProfile)>) -> Result<Vec<K>, RankingError> {
    let totals: Vec<_> = profiles.iter().map(|(_, p)| total_votes(p)).collect();
    if totals.iter().all(|&total| total == 0) {
        return Err(RankingError::NoRecordedVotes);
    }
    if let Some(position) = totals.iter().position(|&total| total == 0) {
        return Err(RankingError::EmptyProfile(position));
    }

    let mut profiles = profiles;
    // `sort_by` is stable.
    profiles.sort_by(|(_, a), (_, b)| compare(b, a));
    Ok(profiles.into_iter().map(|(key, _)| key).collect())
}
