//! Item-by-item review of proposed candidates.
//!
//! Every candidate needs its own answer; there is no bulk accept.

use baches_detection::{Candidate, CandidateSet};
use dialoguer::Confirm;

/// One-line description of a candidate for terminal output.
pub fn describe(index: usize, candidate: &Candidate) -> String {
    let detection = &candidate.detection;
    let mut line = format!(
        "#{}: {} severity, {} / {}, {:.0}% confidence, at {} in {}",
        index + 1,
        detection.severity,
        detection.position,
        detection.distance,
        detection.clamped_confidence() * 100.0,
        candidate.location,
        candidate.zone.legacy_label(),
    );
    if !detection.description.is_empty() {
        line.push_str(" - ");
        line.push_str(&detection.description);
    }
    line
}

/// Prints every candidate without asking anything.
pub fn list(set: &CandidateSet) {
    println!("{} candidate(s) around {}:", set.len(), set.base());
    for (index, candidate) in set.candidates().iter().enumerate() {
        println!("  {}", describe(index, candidate));
    }
}

/// Asks about each candidate in turn, accepting or discarding it.
pub fn review(set: &mut CandidateSet) -> Result<(), Box<dyn std::error::Error>> {
    println!("{} candidate(s) around {}:", set.len(), set.base());

    for index in 0..set.len() {
        println!("{}", describe(index, &set.candidates()[index]));

        let keep = Confirm::new()
            .with_prompt("Report this pothole?")
            .default(false)
            .interact()?;

        if keep {
            set.accept(index)?;
        } else {
            set.discard(index)?;
        }
    }

    log::debug!("{} candidate(s) left undecided", set.undecided_count());
    Ok(())
}

#[cfg(test)]
mod tests {
    use baches_geography::ZoneClassifier;
    use baches_report_models::{
        Coordinate, Detection, QualitativeDistance, QualitativePosition, Severity,
    };

    use super::*;

    #[test]
    fn describe_includes_label_and_description() {
        let set = baches_detection::propose(
            Coordinate::new(16.3219, -96.5958),
            0.0,
            vec![Detection {
                severity: Severity::High,
                position: QualitativePosition::Left,
                distance: QualitativeDistance::Far,
                confidence: 0.87,
                description: "grieta ancha".to_string(),
            }],
            &ZoneClassifier::default(),
        )
        .unwrap();

        let line = describe(0, &set.candidates()[0]);
        assert!(line.starts_with("#1: HIGH severity, LEFT / FAR, 87% confidence"));
        assert!(line.contains("Centro"));
        assert!(line.ends_with(" - grieta ancha"));
    }
}
