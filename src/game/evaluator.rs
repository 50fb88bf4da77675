//! Évaluation d'une classification contre la couleur attendue
//!
//! Les classes sont parcourues dans l'ordre du modèle et la **première** dont
//! la probabilité dépasse le seuil l'emporte, même si une classe suivante a
//! une probabilité plus élevée.

use super::palette::Color;
use crate::inference::{ClassificationResult, InferenceError};

/// Issue d'une manche
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Couleur détectée et attendue
    Correct,
    /// Couleur détectée mais pas celle attendue
    Incorrect,
    /// Aucune classe au-dessus du seuil, ou moteur en erreur
    Failed,
}

/// Verdict d'une manche
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub outcome: Outcome,
    /// Label retenu, s'il y en a un
    pub detected: Option<String>,
    /// Série après la manche
    pub streak: u32,
}

impl Verdict {
    /// Manche échouée : la série repart de zéro
    pub fn failed() -> Self {
        Self {
            outcome: Outcome::Failed,
            detected: None,
            streak: 0,
        }
    }

    /// Couleur détectée, si le label en est une
    pub fn detected_color(&self) -> Option<Color> {
        self.detected.as_deref().and_then(Color::from_label)
    }

    /// Message affiché sous le mot
    pub fn message(&self) -> String {
        let detected = match (self.detected_color(), self.detected.as_deref()) {
            (Some(color), _) => color.display_name().to_string(),
            (None, Some(label)) => label.to_uppercase(),
            (None, None) => String::new(),
        };
        match self.outcome {
            Outcome::Correct => format!("Nice job! Detected {}", detected),
            Outcome::Incorrect => format!("Incorrect. Detected {}", detected),
            Outcome::Failed => "Classification failed".to_string(),
        }
    }
}

/// Vérifie que le moteur rend une prédiction par couleur, dans l'ordre du
/// modèle ; sinon l'ordre de scan ne voudrait plus rien dire
pub fn check_labels(result: &ClassificationResult) -> Result<(), InferenceError> {
    let labels: Vec<&str> = result.predictions.iter().map(|p| p.label.as_str()).collect();
    let in_order = labels.len() == Color::ALL.len()
        && labels
            .iter()
            .zip(Color::ALL)
            .all(|(label, color)| Color::from_label(label) == Some(color));

    if in_order {
        Ok(())
    } else {
        Err(InferenceError::Malformed(format!(
            "labels inattendus: {:?}",
            labels
        )))
    }
}

/// Évalue un résultat de classification
///
/// Fonction pure : même entrée, même verdict.
pub fn evaluate(
    result: &ClassificationResult,
    expected: Color,
    streak: u32,
    threshold: f32,
) -> Verdict {
    let Some(hit) = result.predictions.iter().find(|p| p.value > threshold) else {
        return Verdict::failed();
    };

    let matches = Color::from_label(&hit.label) == Some(expected);
    if matches {
        Verdict {
            outcome: Outcome::Correct,
            detected: Some(hit.label.clone()),
            streak: streak.saturating_add(1),
        }
    } else {
        Verdict {
            outcome: Outcome::Incorrect,
            detected: Some(hit.label.clone()),
            streak: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::Prediction;

    const THRESHOLD: f32 = 0.6;

    fn result(values: [f32; 7]) -> ClassificationResult {
        ClassificationResult::from_predictions(
            Color::ALL
                .iter()
                .zip(values)
                .map(|(c, v)| Prediction::new(c.label(), v))
                .collect(),
        )
    }

    #[test]
    fn first_class_above_threshold_wins_over_the_global_max() {
        let verdict = evaluate(
            &result([0.65, 0.7, 0.1, 0.0, 0.0, 0.0, 0.0]),
            Color::Green,
            4,
            THRESHOLD,
        );
        assert_eq!(verdict.detected.as_deref(), Some("red"));
        assert_eq!(verdict.outcome, Outcome::Incorrect);
        assert_eq!(verdict.streak, 0);
    }

    #[test]
    fn nothing_above_threshold_fails() {
        let verdict = evaluate(&result([0.5; 7]), Color::Blue, 3, THRESHOLD);
        assert_eq!(verdict, Verdict::failed());
        assert_eq!(verdict.message(), "Classification failed");
    }

    #[test]
    fn threshold_is_strict() {
        let verdict = evaluate(&result([0.6, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]), Color::Red, 1, THRESHOLD);
        assert_eq!(verdict.outcome, Outcome::Failed);
    }

    #[test]
    fn confident_match_extends_the_streak() {
        let verdict = evaluate(
            &result([0.1, 0.9, 0.0, 0.0, 0.0, 0.0, 0.0]),
            Color::Green,
            2,
            THRESHOLD,
        );
        assert_eq!(verdict.outcome, Outcome::Correct);
        assert_eq!(verdict.streak, 3);
        assert_eq!(verdict.detected_color(), Some(Color::Green));
        assert_eq!(verdict.message(), "Nice job! Detected GREEN");
    }

    #[test]
    fn confident_mismatch_records_the_wrong_label() {
        let verdict = evaluate(
            &result([0.0, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0]),
            Color::Yellow,
            7,
            THRESHOLD,
        );
        assert_eq!(verdict.outcome, Outcome::Incorrect);
        assert_eq!(verdict.detected_color(), Some(Color::Blue));
        assert_eq!(verdict.streak, 0);
        assert_eq!(verdict.message(), "Incorrect. Detected BLUE");
    }

    #[test]
    fn unknown_confident_label_is_incorrect() {
        let result = ClassificationResult::from_predictions(vec![
            Prediction::new("noise", 0.95),
            Prediction::new("red", 0.9),
        ]);
        let verdict = evaluate(&result, Color::Red, 1, THRESHOLD);
        assert_eq!(verdict.outcome, Outcome::Incorrect);
        assert_eq!(verdict.detected_color(), None);
        assert_eq!(verdict.message(), "Incorrect. Detected NOISE");
    }

    #[test]
    fn labels_must_follow_the_model_order() {
        assert!(check_labels(&result([0.0; 7])).is_ok());

        let prefixed = ClassificationResult::from_predictions(
            Color::ALL
                .iter()
                .enumerate()
                .map(|(i, c)| Prediction::new(format!("{:02}_{}", i, c.label()), 0.0))
                .collect(),
        );
        assert!(check_labels(&prefixed).is_ok());

        let mut alphabetical: Vec<&str> = Color::ALL.iter().map(|c| c.label()).collect();
        alphabetical.sort_unstable();
        let alphabetical = ClassificationResult::from_predictions(
            alphabetical.into_iter().map(|l| Prediction::new(l, 0.0)).collect(),
        );
        assert!(matches!(
            check_labels(&alphabetical),
            Err(InferenceError::Malformed(_))
        ));

        let missing = ClassificationResult::from_predictions(vec![Prediction::new("red", 0.9)]);
        assert!(matches!(check_labels(&missing), Err(InferenceError::Malformed(_))));
    }

    #[test]
    fn every_outcome_respects_the_streak_rule() {
        let grid = [0.0, 0.3, 0.61, 0.9];
        for expected in Color::ALL {
            for &a in &grid {
                for &b in &grid {
                    let mut values = [0.0; 7];
                    values[expected as usize] = a;
                    values[(expected as usize + 3) % 7] = b;
                    let verdict = evaluate(&result(values), expected, 5, THRESHOLD);
                    match verdict.outcome {
                        Outcome::Correct => assert_eq!(verdict.streak, 6),
                        Outcome::Incorrect | Outcome::Failed => assert_eq!(verdict.streak, 0),
                    }
                    assert_eq!(verdict, evaluate(&result(values), expected, 5, THRESHOLD));
                }
            }
        }
    }

    #[test]
    fn streak_saturates_instead_of_overflowing() {
        let verdict = evaluate(
            &result([0.9, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            Color::Red,
            u32::MAX,
            THRESHOLD,
        );
        assert_eq!(verdict.streak, u32::MAX);
    }
}
