// src/core/scoring/mod.rs

//! Pure scoring functions. Nothing in here touches the network or the clock;
//! callers pass in everything a score depends on.

pub mod headers;
pub mod tls;

use crate::core::models::Grade;

/// Score reported as the maximum for display, whatever the catalog adds up to.
pub const MAX_SCORE: u32 = 10;

/// A fixed threshold table: the first entry whose threshold the score reaches
/// wins, anything below the last threshold is an F.
pub struct GradeScale(&'static [(i32, Grade)]);

pub const HEADER_GRADES: GradeScale =
    GradeScale(&[(9, Grade::A), (7, Grade::B), (5, Grade::C), (3, Grade::D)]);

pub const TLS_GRADES: GradeScale =
    GradeScale(&[(8, Grade::A), (6, Grade::B), (4, Grade::C), (2, Grade::D)]);

impl GradeScale {
    pub fn grade(&self, score: i32) -> Grade {
        self.0
            .iter()
            .find(|(threshold, _)| score >= *threshold)
            .map_or(Grade::F, |(_, grade)| *grade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_boundaries_map_to_the_higher_grade() {
        assert_eq!(HEADER_GRADES.grade(9), Grade::A);
        assert_eq!(HEADER_GRADES.grade(8), Grade::B);
        assert_eq!(HEADER_GRADES.grade(7), Grade::B);
        assert_eq!(HEADER_GRADES.grade(5), Grade::C);
        assert_eq!(HEADER_GRADES.grade(3), Grade::D);
        assert_eq!(HEADER_GRADES.grade(2), Grade::F);
        assert_eq!(HEADER_GRADES.grade(11), Grade::A);
    }

    #[test]
    fn tls_boundaries_map_to_the_higher_grade() {
        assert_eq!(TLS_GRADES.grade(8), Grade::A);
        assert_eq!(TLS_GRADES.grade(6), Grade::B);
        assert_eq!(TLS_GRADES.grade(4), Grade::C);
        assert_eq!(TLS_GRADES.grade(2), Grade::D);
        assert_eq!(TLS_GRADES.grade(1), Grade::F);
        assert_eq!(TLS_GRADES.grade(-3), Grade::F);
    }

    #[test]
    fn grades_never_improve_as_the_score_drops() {
        for scale in [&HEADER_GRADES, &TLS_GRADES] {
            let grades: Vec<Grade> = (-5..=15).map(|s| scale.grade(s)).collect();
            // Grade::A orders first, so a rising score gives a non-increasing sequence.
            assert!(grades.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
