use clap::{Parser, Subcommand};
use std::path::PathBuf;

use formscan::detection::preprocessing::Binarizer;
use formscan::pipeline::load_image;
use formscan::{
    BatchExecutor, FieldOutcome, FormPipeline, FormResult, FormTemplate, FormTemplateBuilder,
    PipelineConfig, Point, ScanSource,
};

#[derive(Parser)]
#[command(name = "formscan")]
#[command(about = "Register scanned forms against a template and cut out handwritten glyphs")]
struct Cli {
    /// JSON pipeline configuration
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Author a template from a blank form
    Template {
        /// Blank form image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Approximate marker centers as x,y (exactly three)
        #[arg(long = "marker", value_parser = parse_point, num_args = 3, required = true)]
        markers: Vec<Point>,

        /// Expected marker side in pixels
        #[arg(long, default_value_t = 20)]
        marker_size: u32,

        /// A point inside each field as x,y
        #[arg(long = "field", value_parser = parse_point)]
        fields: Vec<Point>,

        /// Where to write the template
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Print a template summary
    Inspect {
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,
    },

    /// Register one scan and segment its fields
    Register {
        #[arg(short, long, value_name = "TEMPLATE")]
        template: PathBuf,

        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Save debug outputs to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,

        /// Write normalised glyphs to directory
        #[arg(long, value_name = "DIR")]
        glyphs: Option<PathBuf>,
    },

    /// Register many scans in parallel
    Batch {
        #[arg(short, long, value_name = "TEMPLATE")]
        template: PathBuf,

        #[arg(value_name = "IMAGES", required = true)]
        images: Vec<PathBuf>,

        /// Write normalised glyphs to directory
        #[arg(long, value_name = "DIR")]
        glyphs: Option<PathBuf>,

        /// Worker threads (defaults to the config value)
        #[arg(long)]
        workers: Option<usize>,
    },
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got '{s}'"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x in '{s}': {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y in '{s}': {e}"))?;
    Ok(Point::new(x, y))
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_filter = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e))?,
        None => PipelineConfig::default(),
    };

    match args.command {
        Command::Template {
            image,
            markers,
            marker_size,
            fields,
            output,
        } => {
            let img = load_image(&image)?;
            let grid = config.binarization.binarize(&img);
            let positions: [Point; 3] = markers
                .try_into()
                .map_err(|_| anyhow::anyhow!("Exactly three --marker positions are required"))?;

            let mut builder = FormTemplateBuilder::from_raster(&grid, positions, marker_size, config.polarity)?;
            for seed in fields {
                if !builder.add_field_at(&grid, seed)? {
                    eprintln!("Field at {seed} overlaps an existing field, skipped");
                }
            }
            let template = builder.build();
            template.save(&output)?;
            println!("Template with {} fields written to {}", template.field_count(), output.display());
        }

        Command::Inspect { template } => {
            let template = FormTemplate::load(&template)?;
            print_template(&template);
        }

        Command::Register {
            template,
            image,
            debug_out,
            glyphs,
        } => {
            let template = FormTemplate::load(&template)?;
            let mut pipeline = FormPipeline::new(template, config);
            if let Some(dir) = debug_out {
                pipeline = pipeline.with_debug(dir)?;
            }
            if let Some(dir) = glyphs {
                pipeline = pipeline.with_glyph_output(dir);
            }
            let result = pipeline.process_path(&image)?;
            print_result(&result);
        }

        Command::Batch {
            template,
            images,
            glyphs,
            workers,
        } => {
            let template = FormTemplate::load(&template)?;
            let mut pipeline = FormPipeline::new(template, config);
            if let Some(dir) = glyphs {
                pipeline = pipeline.with_glyph_output(dir);
            }
            let mut executor = BatchExecutor::new(pipeline);
            if let Some(n) = workers {
                executor = executor.with_workers(n);
            }

            let outcomes = executor.execute(images.into_iter().map(ScanSource::Path).collect())?;
            let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(result) => print_result(result),
                    Err(e) => println!("{}: FAILED ({:#})", outcome.name, e),
                }
            }
            println!("\n{} forms, {} failed", outcomes.len(), failed);
        }
    }

    Ok(())
}

fn print_template(template: &FormTemplate) {
    println!("=== Form Template ===");
    println!("Size: {}x{}", template.width(), template.height());
    println!("Polarity: {:?}", template.polarity());
    println!("Marker size: {}", template.marker_size());
    let [a, b, c] = template.marker_positions();
    println!("Markers: {a} {b} {c}");
    println!("Coordinate system: {}", template.coordinate_system());
    println!("Fields: {}", template.field_count());
    for (i, field) in template.fields().iter().enumerate() {
        println!("  {:03}: {}", i, field.bounding_rect());
    }
}

fn print_result(result: &FormResult) {
    println!("\n=== {} ===", result.name);
    println!("Rotation: {:.4} rad", result.segments.rotation);
    for (i, field) in result.segments.fields.iter().enumerate() {
        let value = result
            .values
            .as_ref()
            .and_then(|v| v.get(i))
            .map(|v| format!(" \"{}\"", v.text))
            .unwrap_or_default();
        match &field.outcome {
            FieldOutcome::Segmented(glyphs) => {
                println!("  field {:03} at {}: {} glyphs{}", field.index, field.window, glyphs.len(), value)
            }
            FieldOutcome::Skipped(e) => println!("  field {:03}: skipped ({})", field.index, e),
        }
    }
}
