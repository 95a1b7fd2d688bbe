//! Boundary to an external glyph classifier and checks on the values it
//! produces.

use std::fmt;

use crate::detection::preprocessing::normalize_glyph;
use crate::error::{FormError, Result};
use crate::models::GlyphSegment;
use crate::raster::{Polarity, Raster};

/// Characters a glyph can be classified as, in classifier output order.
pub const LABELS: [char; 11] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '.'];

/// Recognises a single normalised glyph.
pub trait GlyphClassifier: Send + Sync {
    /// Length of the input vector, the square of the glyph side
    fn input_size(&self) -> usize;

    fn classify(&self, input: &[f64]) -> Result<char>;
}

/// Label with the highest activation; ties go to the lower index.
pub fn decode_output(activations: &[f64]) -> Option<char> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &value) in activations.iter().enumerate().take(LABELS.len()) {
        if best.is_none_or(|(_, max)| value > max) {
            best = Some((i, value));
        }
    }
    best.map(|(i, _)| LABELS[i])
}

type Forward = dyn Fn(&[f64]) -> Result<Vec<f64>> + Send + Sync;

/// Classifier backed by a network's forward pass: one activation per entry
/// of [`LABELS`], decoded with [`decode_output`].
pub struct NetworkClassifier {
    input_size: usize,
    forward: Box<Forward>,
}

impl NetworkClassifier {
    pub fn new(
        input_size: usize,
        forward: impl Fn(&[f64]) -> Result<Vec<f64>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            input_size,
            forward: Box::new(forward),
        }
    }
}

impl GlyphClassifier for NetworkClassifier {
    fn input_size(&self) -> usize {
        self.input_size
    }

    fn classify(&self, input: &[f64]) -> Result<char> {
        if input.len() != self.input_size {
            return Err(FormError::InvalidArgument(format!(
                "classifier expects {} inputs, got {}",
                self.input_size,
                input.len()
            )));
        }
        let activations = (self.forward)(input)?;
        decode_output(&activations)
            .ok_or_else(|| FormError::InvalidArgument("network produced no activations".to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Something suspicious about a classified field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub severity: Severity,
    pub message: &'static str,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        write!(f, "{level}: {}", self.message)
    }
}

/// Classified text of one field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldValue {
    pub text: String,
    pub issue: Option<FieldIssue>,
}

/// Normalises `text` and reports the first problem with it.
///
/// Doubled separators are collapsed first, so `"1..5"` reads as `"1.5"`.
pub fn check_field_value(text: &str) -> FieldValue {
    let mut normalized = text.to_string();
    while normalized.contains("..") {
        normalized = normalized.replace("..", ".");
    }

    let chars: Vec<char> = normalized.chars().collect();
    let issue = if chars.iter().filter(|&&c| c == '.').count() > 1 {
        Some(FieldIssue {
            severity: Severity::Error,
            message: "multiple decimal separators",
        })
    } else if chars.len() > 2 && chars[0] == '0' && chars[1] != '.' {
        Some(FieldIssue {
            severity: Severity::Warning,
            message: "possible leading zero misclassification",
        })
    } else {
        None
    };

    FieldValue {
        text: normalized,
        issue,
    }
}

/// Side of the square glyph raster a classifier expects.
pub fn glyph_side(classifier: &dyn GlyphClassifier) -> Result<u32> {
    let size = classifier.input_size();
    let side = (size as f64).sqrt().round() as u32;
    if side == 0 || (side as usize) * (side as usize) != size {
        return Err(FormError::InvalidArgument(format!(
            "classifier input size {size} is not a square"
        )));
    }
    Ok(side)
}

/// Classifies the glyphs of one field left to right and checks the result.
pub fn classify_field(
    glyphs: &[GlyphSegment],
    classifier: &dyn GlyphClassifier,
    polarity: Polarity,
) -> Result<FieldValue> {
    let side = glyph_side(classifier)?;
    let mut text = String::with_capacity(glyphs.len());
    for glyph in glyphs {
        let input = normalize_glyph(&glyph.raster, side, polarity).to_input_vector();
        text.push(classifier.classify(&input)?);
    }
    Ok(check_field_value(&text))
}
