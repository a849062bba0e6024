use std::{collections::BTreeMap, path::Path, sync::Arc};

use anyhow::{Context, anyhow};
use doctormate_directory::{Enricher, mapper::SKIN_LESION_CODES};
use tracing::info;
use tract_onnx::prelude::*;

use crate::{
    error::AnalysisError,
    knowledge::KnowledgeBase,
    models::{Assessment, SKIN_DISCLAIMER, SkinAdditionalInfo, SkinAnalysis, clamp_percent},
    preprocess::ImageTensor,
};

/// A classifier returning one score per entry of [`SKIN_LESION_CODES`].
pub trait LesionModel: Send + Sync {
    fn infer(&self, input: &ImageTensor) -> anyhow::Result<Vec<f32>>;
}

type OnnxPlan = TypedRunnableModel<TypedModel>;

/// Pretrained MobileNetV2 lesion classifier, run through tract.
pub struct OnnxLesionModel {
    plan: OnnxPlan,
}

impl OnnxLesionModel {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        info!("Loading skin lesion model from {}", path.display());

        let shape: TVec<usize> = ImageTensor::SHAPE.iter().copied().collect();
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("failed to read ONNX model {}", path.display()))?
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), shape))?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self { plan })
    }
}

impl LesionModel for OnnxLesionModel {
    fn infer(&self, input: &ImageTensor) -> anyhow::Result<Vec<f32>> {
        let [n, h, w, c] = ImageTensor::SHAPE;
        let tensor = tract_ndarray::Array4::from_shape_vec((n, h, w, c), input.data.clone())?
            .into_tensor();

        let outputs = self.plan.run(tvec!(tensor.into()))?;
        let scores = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?
            .to_array_view::<f32>()?
            .iter()
            .copied()
            .collect();

        Ok(scores)
    }
}

/// Runs the lesion classifier and turns its scores into a [`SkinAnalysis`].
pub struct SkinAnalyzer {
    model: Arc<dyn LesionModel>,
    knowledge: KnowledgeBase,
    enricher: Enricher,
}

impl SkinAnalyzer {
    pub fn new(model: Arc<dyn LesionModel>, knowledge: KnowledgeBase, enricher: Enricher) -> Self {
        Self {
            model,
            knowledge,
            enricher,
        }
    }

    pub async fn predict(
        &self,
        input: ImageTensor,
        token: Option<&str>,
    ) -> Result<SkinAnalysis, AnalysisError> {
        let model = self.model.clone();
        let scores = tokio::task::spawn_blocking(move || model.infer(&input))
            .await
            .map_err(|e| AnalysisError::Inference(e.to_string()))?
            .map_err(|e| AnalysisError::Inference(format!("{e:#}")))?;

        if scores.len() != SKIN_LESION_CODES.len() {
            return Err(AnalysisError::Inference(format!(
                "expected {} class scores, got {}",
                SKIN_LESION_CODES.len(),
                scores.len()
            )));
        }

        let probabilities = class_probabilities(&scores);
        let best = argmax(&probabilities);
        let code = SKIN_LESION_CODES[best];
        let confidence = clamp_percent(f64::from(probabilities[best]) * 100.0);

        info!(
            diagnosis_code = %code,
            confidence = confidence,
            "Skin lesion classified"
        );

        let info = self.knowledge.lookup(code);
        let enrichment = self.enricher.enrich_skin(token, code).await;

        Ok(SkinAnalysis {
            assessment: Assessment {
                possible_diagnosis: info.name,
                confidence,
                severity: info.severity,
                description: info.description,
                recommendations: info.recommendations,
                emergency_care: info.emergency_care,
                disclaimer: SKIN_DISCLAIMER.to_string(),
            },
            additional_info: SkinAdditionalInfo {
                diagnosis_code: code.to_string(),
                risk_factors: info.risk_factors,
                symptoms: info.symptoms,
                prognosis: info.prognosis,
                treatment_options: info.treatment_options,
                all_probabilities: percentages(&probabilities),
            },
            enrichment,
        })
    }
}

/// Uses the scores directly when they already form a distribution, otherwise applies softmax.
pub fn class_probabilities(scores: &[f32]) -> Vec<f32> {
    let sum: f32 = scores.iter().sum();
    let is_distribution =
        scores.iter().all(|s| (0.0..=1.0).contains(s)) && (sum - 1.0).abs() < 1e-3;
    if is_distribution {
        return scores.to_vec();
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Index of the highest score; the first one wins on ties.
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

fn percentages(probabilities: &[f32]) -> BTreeMap<String, f64> {
    SKIN_LESION_CODES
        .iter()
        .zip(probabilities)
        .map(|(code, p)| {
            let percent = (f64::from(*p) * 1000.0).round() / 10.0;
            (code.to_string(), percent)
        })
        .collect()
}
