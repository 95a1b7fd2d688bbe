use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage, ImageReader};

use crate::cancel::CancellationToken;
use crate::classify::{FieldValue, GlyphClassifier, classify_field};
use crate::config::PipelineConfig;
use crate::detection::preprocessing::{Binarizer, normalize_glyph};
use crate::form::{FormInstance, FormTemplate};
use crate::models::{FormResult, FormSegments};
use crate::raster::Raster;

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs, one subdirectory per form
    pub output_dir: PathBuf,
}

impl DebugConfig {
    fn save(&self, form: &str, file: &str, image: &GrayImage) -> Result<()> {
        let path = self.output_dir.join(form).join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        image
            .save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to save debug image {}: {}", path.display(), e))?;
        log::debug!("saved debug image {}", path.display());
        Ok(())
    }
}

/// Runs scans through binarization, registration, segmentation and, when a
/// classifier is attached, recognition.
pub struct FormPipeline {
    template: FormTemplate,
    config: PipelineConfig,
    binarizer: Arc<dyn Binarizer>,
    classifier: Option<Arc<dyn GlyphClassifier>>,
    debug: Option<DebugConfig>,
    glyph_dir: Option<PathBuf>,
    cancel: CancellationToken,
}

impl FormPipeline {
    /// Create a pipeline for one template
    pub fn new(template: FormTemplate, config: PipelineConfig) -> Self {
        Self {
            template,
            binarizer: Arc::new(config.binarization),
            config,
            classifier: None,
            debug: None,
            glyph_dir: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_binarizer(mut self, binarizer: Arc<dyn Binarizer>) -> Self {
        self.binarizer = binarizer;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn GlyphClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Write normalised glyphs below `dir` as `field_FFF/<form>/GG.png`
    pub fn with_glyph_output(mut self, dir: PathBuf) -> Self {
        self.glyph_dir = Some(dir);
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    pub fn template(&self) -> &FormTemplate {
        &self.template
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Load and process a scan from disk; the form is named after the file stem
    pub fn process_path(&self, path: &Path) -> Result<FormResult> {
        let img = load_image(path)?;
        self.process(&img, &form_name(path))
    }

    /// Process one scan
    pub fn process(&self, img: &DynamicImage, name: &str) -> Result<FormResult> {
        self.cancel.check()?;
        log::info!("processing form {} ({}x{})", name, img.width(), img.height());

        let gray = self.binarizer.to_grayscale(img);
        let binary = self.binarizer.to_binary(&gray);
        if let Some(debug) = &self.debug {
            debug.save(name, "00_input.png", &gray)?;
            debug.save(name, "01_binarized.png", &binary.to_luma())?;
        }

        let instance = FormInstance::register(binary, &self.template, &self.config, &self.cancel)
            .with_context(|| format!("Failed to register form {name}"))?;
        if let Some(debug) = &self.debug {
            debug.save(name, "02_aligned.png", &instance.aligned().to_luma())?;
        }

        let segments = instance.segment_fields(&self.template, &self.config);
        if let Some(debug) = &self.debug {
            self.save_field_debug(debug, name, &instance, &segments)?;
        }
        if let Some(dir) = &self.glyph_dir {
            self.write_glyphs(dir, name, &segments)?;
        }

        let values = match &self.classifier {
            Some(classifier) => Some(self.classify(classifier.as_ref(), &segments)?),
            None => None,
        };

        log::info!(
            "form {}: {} fields, {} glyphs, {} skipped",
            name,
            segments.fields.len(),
            segments.glyph_count(),
            segments.skipped_count()
        );
        Ok(FormResult {
            name: name.to_string(),
            segments,
            values,
        })
    }

    fn classify(&self, classifier: &dyn GlyphClassifier, segments: &FormSegments) -> Result<Vec<FieldValue>> {
        let polarity = self.template.polarity();
        let mut values = Vec::with_capacity(segments.fields.len());
        for field in &segments.fields {
            let value = classify_field(field.glyphs(), classifier, polarity)
                .with_context(|| format!("Failed to classify field {}", field.index))?;
            if let Some(issue) = &value.issue {
                log::warn!("field {} value {:?}: {}", field.index, value.text, issue);
            }
            values.push(value);
        }
        Ok(values)
    }

    fn save_field_debug(
        &self,
        debug: &DebugConfig,
        name: &str,
        instance: &FormInstance,
        segments: &FormSegments,
    ) -> Result<()> {
        for field in segments.fields.iter().filter(|f| !f.is_skipped()) {
            let dir = format!("field_{:03}", field.index);
            let crop = instance.aligned().view_of(field.window)?;
            debug.save(name, &format!("{dir}/crop.png"), &crop.to_luma())?;
            for (i, glyph) in field.glyphs().iter().enumerate() {
                debug.save(name, &format!("{dir}/{i:02}.png"), &glyph.raster.to_luma())?;
            }
        }
        Ok(())
    }

    fn write_glyphs(&self, dir: &Path, name: &str, segments: &FormSegments) -> Result<()> {
        let polarity = self.template.polarity();
        for field in &segments.fields {
            if field.glyphs().is_empty() {
                continue;
            }
            let field_dir = dir.join(format!("field_{:03}", field.index)).join(name);
            std::fs::create_dir_all(&field_dir)?;
            for (i, glyph) in field.glyphs().iter().enumerate() {
                let path = field_dir.join(format!("{i:02}.png"));
                normalize_glyph(&glyph.raster, self.config.glyph_size, polarity)
                    .to_luma()
                    .save(&path)
                    .map_err(|e| anyhow::anyhow!("Failed to save glyph {}: {}", path.display(), e))?;
            }
        }
        Ok(())
    }
}

/// Load an image file
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image {}: {}", path.display(), e))
}

fn form_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "form".to_string())
}

/// Where a batch item's pixels come from
pub enum ScanSource {
    Path(PathBuf),
    Image { name: String, image: DynamicImage },
}

impl ScanSource {
    pub fn name(&self) -> String {
        match self {
            ScanSource::Path(path) => form_name(path),
            ScanSource::Image { name, .. } => name.clone(),
        }
    }
}

/// Work item for batch execution
struct WorkItem {
    index: usize,
    source: ScanSource,
}

/// Outcome of one form in a batch
pub struct BatchOutcome {
    pub name: String,
    pub result: Result<FormResult>,
}

/// Batch executor: a fixed pool of workers fed through an MPSC channel
pub struct BatchExecutor {
    pipeline: Arc<FormPipeline>,
    workers: usize,
}

impl BatchExecutor {
    pub fn new(pipeline: FormPipeline) -> Self {
        let workers = pipeline.config().worker_count();
        Self {
            pipeline: Arc::new(pipeline),
            workers,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn pipeline(&self) -> &FormPipeline {
        &self.pipeline
    }

    /// Process every scan. Results come back in input order; one failing form
    /// does not stop the others.
    pub fn execute(&self, inputs: Vec<ScanSource>) -> Result<Vec<BatchOutcome>> {
        let total = inputs.len();
        let (work_tx, work_rx): (Sender<WorkItem>, Receiver<WorkItem>) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel::<(usize, BatchOutcome)>();

        for (index, source) in inputs.into_iter().enumerate() {
            work_tx
                .send(WorkItem { index, source })
                .map_err(|e| anyhow::anyhow!("Failed to send work item: {}", e))?;
        }
        // Workers stop once the queue is drained
        drop(work_tx);

        let work_rx = Arc::new(Mutex::new(work_rx));
        let workers = self.workers.clamp(1, total.max(1));
        log::info!("processing {} forms on {} workers", total, workers);

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let work_rx = Arc::clone(&work_rx);
                let result_tx = result_tx.clone();
                let pipeline = Arc::clone(&self.pipeline);
                scope.spawn(move || {
                    loop {
                        let next = match work_rx.lock() {
                            Ok(rx) => rx.recv(),
                            Err(_) => break,
                        };
                        let Ok(item) = next else {
                            break;
                        };
                        let outcome = run_item(&pipeline, item.source);
                        if result_tx.send((item.index, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_tx);

        let mut results: Vec<(usize, BatchOutcome)> = result_rx.into_iter().collect();
        results.sort_by_key(|(index, _)| *index);
        if results.len() != total {
            return Err(anyhow::anyhow!(
                "Batch lost forms: {} of {} finished",
                results.len(),
                total
            ));
        }
        Ok(results.into_iter().map(|(_, outcome)| outcome).collect())
    }
}

fn run_item(pipeline: &FormPipeline, source: ScanSource) -> BatchOutcome {
    let name = source.name();
    let result = match source {
        ScanSource::Path(path) => pipeline.process_path(&path),
        ScanSource::Image { name, image } => pipeline.process(&image, &name),
    };
    if let Err(e) = &result {
        log::warn!("form {} failed: {:#}", name, e);
    }
    BatchOutcome { name, result }
}
