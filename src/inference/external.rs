//! Moteur d'inférence externe lancé en sous-processus
//!
//! Le signal est envoyé sur stdin en f32 little-endian ; le processus répond
//! une ligne `<label> <probabilité>` par classe, dans l'ordre du modèle.
//! Lignes optionnelles : `anomaly <valeur>`, `dsp_ms <n>`, `anomaly_ms <n>`.

use super::engine::{
    ClassificationResult, InferenceEngine, InferenceError, Prediction, SignalSource, Timing,
};
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Instant;

/// Taille des fenêtres tirées du signal
const CHUNK_SIZE: usize = 1024;

/// Moteur externe (commande shell-split)
pub struct ExternalEngine {
    program: Option<String>,
    args: Vec<String>,
}

impl ExternalEngine {
    /// Crée le moteur depuis une ligne de commande
    ///
    /// Sans commande, chaque classification échoue avec `NotConfigured`.
    pub fn new(command: Option<&str>) -> Self {
        let mut parts = command
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string);
        let program = parts.next();
        let args = parts.collect();

        match &program {
            Some(program) => tracing::info!("Moteur d'inférence externe: {}", program),
            None => tracing::warn!("Aucun moteur d'inférence configuré (STROOP_ENGINE_CMD)"),
        }

        Self { program, args }
    }

    /// Le moteur a-t-il une commande ?
    pub fn is_configured(&self) -> bool {
        self.program.is_some()
    }
}

impl InferenceEngine for ExternalEngine {
    fn run_classifier(
        &mut self,
        signal: &dyn SignalSource,
    ) -> Result<ClassificationResult, InferenceError> {
        let program = self.program.as_deref().ok_or(InferenceError::NotConfigured)?;
        let payload = encode_signal(signal)?;

        let started = Instant::now();
        let mut child = Command::new(program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| InferenceError::Spawn(format!("{}: {}", program, e)))?;

        // Écriture dans un thread pour ne pas bloquer sur un pipe plein
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| InferenceError::Spawn("stdin indisponible".to_string()))?;
        let writer = thread::spawn(move || stdin.write_all(&payload));

        let output = child
            .wait_with_output()
            .map_err(|e| InferenceError::Spawn(e.to_string()))?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if let Ok(Err(e)) = writer.join() {
            tracing::debug!("Écriture du signal interrompue: {}", e);
        }

        if !output.status.success() {
            return Err(InferenceError::Status(output.status.code().unwrap_or(-1)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut result = parse_output(&stdout)?;
        result.timing.classification_ms = elapsed_ms.saturating_sub(result.timing.dsp_ms);
        Ok(result)
    }

    fn name(&self) -> &str {
        self.program.as_deref().unwrap_or("external")
    }
}

fn encode_signal(signal: &dyn SignalSource) -> Result<Vec<u8>, InferenceError> {
    let total = signal.total_length();
    let mut payload = Vec::with_capacity(total * std::mem::size_of::<f32>());
    let mut chunk = [0.0f32; CHUNK_SIZE];

    let mut offset = 0;
    while offset < total {
        let len = CHUNK_SIZE.min(total - offset);
        signal.get_data(offset, &mut chunk[..len])?;
        for value in &chunk[..len] {
            payload.extend_from_slice(&value.to_le_bytes());
        }
        offset += len;
    }
    Ok(payload)
}

fn parse_output(stdout: &str) -> Result<ClassificationResult, InferenceError> {
    let mut predictions = Vec::new();
    let mut timing = Timing::default();
    let mut anomaly = None;

    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (Some(key), Some(raw), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(InferenceError::Malformed(line.to_string()));
        };

        match key {
            "dsp_ms" => timing.dsp_ms = parse_field(line, raw)?,
            "anomaly_ms" => timing.anomaly_ms = parse_field(line, raw)?,
            "anomaly" => anomaly = Some(parse_field(line, raw)?),
            label => predictions.push(Prediction::new(label, parse_field(line, raw)?)),
        }
    }

    if predictions.is_empty() {
        return Err(InferenceError::Malformed("aucune prédiction".to_string()));
    }

    let mut result = ClassificationResult::from_predictions(predictions);
    result.timing = timing;
    result.anomaly = anomaly;
    Ok(result)
}

fn parse_field<T: std::str::FromStr>(line: &str, raw: &str) -> Result<T, InferenceError> {
    raw.parse()
        .map_err(|_| InferenceError::Malformed(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ConstSignal(Vec<f32>);

    impl SignalSource for ConstSignal {
        fn total_length(&self) -> usize {
            self.0.len()
        }

        fn get_data(&self, offset: usize, out: &mut [f32]) -> Result<(), InferenceError> {
            let src = self
                .0
                .get(offset..offset + out.len())
                .ok_or_else(|| InferenceError::Signal("hors limites".to_string()))?;
            out.copy_from_slice(src);
            Ok(())
        }
    }

    #[test]
    fn parses_predictions_in_order_with_extras() {
        let result = parse_output(
            "# modèle v1\nred 0.1\ngreen 0.85\n\nblue 0.05\nanomaly -0.25\ndsp_ms 12\n",
        )
        .unwrap();

        let labels: Vec<&str> = result.predictions.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["red", "green", "blue"]);
        assert_eq!(result.predictions[1].value, 0.85);
        assert_eq!(result.anomaly, Some(-0.25));
        assert_eq!(result.timing.dsp_ms, 12);
    }

    #[test]
    fn rejects_malformed_output() {
        assert!(matches!(parse_output(""), Err(InferenceError::Malformed(_))));
        assert!(matches!(parse_output("red"), Err(InferenceError::Malformed(_))));
        assert!(matches!(parse_output("red high"), Err(InferenceError::Malformed(_))));
        assert!(matches!(parse_output("red 0.1 extra"), Err(InferenceError::Malformed(_))));
    }

    #[test]
    fn signal_is_encoded_little_endian_across_chunks() {
        let samples: Vec<f32> = (0..CHUNK_SIZE + 3).map(|i| i as f32).collect();
        let payload = encode_signal(&ConstSignal(samples.clone())).unwrap();

        assert_eq!(payload.len(), samples.len() * 4);
        let last = &payload[payload.len() - 4..];
        assert_eq!(f32::from_le_bytes([last[0], last[1], last[2], last[3]]), (CHUNK_SIZE + 2) as f32);
    }

    #[test]
    fn unconfigured_engine_always_fails() {
        let mut engine = ExternalEngine::new(None);
        assert!(!engine.is_configured());
        assert!(matches!(
            engine.run_classifier(&ConstSignal(vec![0.0])),
            Err(InferenceError::NotConfigured)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn child_exit_status_is_reported() {
        let mut engine = ExternalEngine::new(Some("false"));
        assert!(engine.is_configured());
        assert!(matches!(
            engine.run_classifier(&ConstSignal(vec![0.0; 4])),
            Err(InferenceError::Status(1))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn child_output_becomes_the_result() {
        let mut engine = ExternalEngine::new(Some("echo red 0.7"));
        let result = engine.run_classifier(&ConstSignal(vec![1.0; 8])).unwrap();
        assert_eq!(result.predictions, vec![Prediction::new("red", 0.7)]);
        assert_eq!(result.anomaly, None);
    }
}
