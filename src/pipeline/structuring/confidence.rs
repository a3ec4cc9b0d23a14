use crate::models::StructuredData;

/// Margin by which an item may exceed the confidence of its source text.
const SOURCE_CONFIDENCE_MARGIN: f32 = 0.05;

/// Extraction confidence: mean of the item confidences, 0 when nothing
/// was extracted.
pub fn extraction_confidence(data: &StructuredData) -> f32 {
    let (sum, count) = data
        .confidences()
        .fold((0.0f32, 0usize), |(sum, count), c| (sum + c, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

/// Cap every item confidence to the source text confidence (OCR) plus a
/// small margin. Poorly recognized text cannot yield confident fields.
pub fn cap_to_source_confidence(data: &mut StructuredData, source_confidence: f32) {
    let cap = (source_confidence + SOURCE_CONFIDENCE_MARGIN).clamp(0.0, 1.0);
    let adjust = |c: &mut f32| *c = c.min(cap);

    data.dates.iter_mut().for_each(|d| adjust(&mut d.confidence));
    data.medications.iter_mut().for_each(|m| adjust(&mut m.confidence));
    data.test_results.iter_mut().for_each(|t| adjust(&mut t.confidence));
    data.diagnoses.iter_mut().for_each(|d| adjust(&mut d.confidence));
    data.providers.iter_mut().for_each(|p| adjust(&mut p.confidence));
    data.appointments.iter_mut().for_each(|a| adjust(&mut a.confidence));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Diagnosis, Provider};

    fn sample() -> StructuredData {
        StructuredData {
            diagnoses: vec![Diagnosis { name: "Hypertension".into(), confidence: 0.6 }],
            providers: vec![Provider {
                name: "Dr. Lisa Wang".into(),
                specialty: "Radiology".into(),
                contact: None,
                confidence: 1.0,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn empty_data_scores_zero() {
        assert_eq!(extraction_confidence(&StructuredData::default()), 0.0);
    }

    #[test]
    fn confidence_is_item_mean() {
        assert!((extraction_confidence(&sample()) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn poor_ocr_caps_items() {
        let mut data = sample();
        cap_to_source_confidence(&mut data, 0.55);
        assert!((data.diagnoses[0].confidence - 0.6).abs() < 1e-6);
        assert!((data.providers[0].confidence - 0.6).abs() < 1e-6);
    }
}
