// Tue Jan 13 2026 - Alex

use crate::analysis::{analyze, AnalyzedLayout};
use crate::codegen::{CodegenError, Generator};
use crate::config::Config;
use crate::layout::TypeLayout;
use crate::output::{JsonError, JsonSerializer, LayoutReport, SchemaReport};
use crate::schema::{Schema, SchemaError};
use crate::utils::logging::ScopedTimer;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("Codegen error: {0}")]
    Codegen(#[from] CodegenError),
    #[error("{0} layout(s) failed analysis")]
    Rejected(usize),
    #[error("Report error: {0}")]
    Report(#[from] JsonError),
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Analysis results for a whole schema, in declaration order.
pub struct Analysis {
    pub layouts: Vec<AnalyzedLayout>,
    /// Set when `fail_fast` stopped the run before every layout was analyzed.
    pub stopped_early: bool,
}

impl Analysis {
    pub fn is_valid(&self) -> bool {
        !self.stopped_early && self.layouts.iter().all(|l| l.is_valid())
    }

    pub fn rejected(&self) -> usize {
        self.layouts.iter().filter(|l| !l.is_valid()).count()
    }

    pub fn get(&self, name: &str) -> Option<&AnalyzedLayout> {
        self.layouts.iter().find(|l| l.type_name() == name)
    }
}

pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn load_schema(&self, path: &Path) -> Result<Schema, PipelineError> {
        let schema = Schema::load(path, self.config.annotation_defaults())?;
        log::info!(
            "Loaded {} layout(s) and {} alias(es) from {}",
            schema.layouts().len(),
            schema.registry().aliases().count(),
            path.display()
        );
        Ok(schema)
    }

    /// Layouts are independent once the registry is built, so they are
    /// analyzed in parallel unless `fail_fast` asks for an ordered stop.
    pub fn analyze_all(&self, schema: &Schema) -> Result<Analysis, PipelineError> {
        let _timer = ScopedTimer::new("analyze schema");
        let registry = schema.registry();

        if self.config.fail_fast {
            let mut layouts = Vec::new();
            for layout in schema.layouts() {
                let analyzed = analyze(layout, registry);
                let valid = analyzed.is_valid();
                layouts.push(analyzed);
                if !valid {
                    log::warn!("Stopping after {} failed analysis", layout.name());
                    let stopped_early = layouts.len() < schema.layouts().len();
                    return Ok(Analysis { layouts, stopped_early });
                }
            }
            return Ok(Analysis {
                layouts,
                stopped_early: false,
            });
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| PipelineError::ThreadPool(e.to_string()))?;

        let layouts: Vec<AnalyzedLayout> = pool.install(|| {
            schema
                .layouts()
                .par_iter()
                .map(|layout| analyze(layout, registry))
                .collect()
        });

        for analyzed in layouts.iter().filter(|l| !l.is_valid()) {
            log::warn!(
                "{} failed analysis with {} error(s)",
                analyzed.type_name(),
                analyzed.errors().len()
            );
        }

        Ok(Analysis {
            layouts,
            stopped_early: false,
        })
    }

    pub fn report(&self, schema: &Schema, analysis: &Analysis) -> SchemaReport {
        let layouts = schema
            .layouts()
            .iter()
            .zip(&analysis.layouts)
            .map(|(layout, analyzed)| LayoutReport::new(layout, analyzed))
            .collect();
        SchemaReport::new(layouts)
    }

    /// Generates one source file for the whole schema. Any rejected layout
    /// fails the run and nothing is emitted.
    pub fn generate(&self, schema: &Schema, analysis: &Analysis, source: Option<&str>) -> Result<String, PipelineError> {
        if !analysis.is_valid() {
            return Err(PipelineError::Rejected(analysis.rejected().max(1)));
        }

        let items: Vec<(&TypeLayout, &AnalyzedLayout)> =
            schema.layouts().iter().zip(analysis.layouts.iter()).collect();
        let generator = Generator::new(schema.registry(), &self.config).with_layouts(schema.layouts());
        Ok(generator.generate_file(&items, source)?)
    }

    /// Load, analyze and generate, writing the output file and optional report.
    /// A rejected schema still gets its report written, but no code.
    pub fn run(&self, schema_path: &Path) -> Result<RunOutput, PipelineError> {
        let schema = self.load_schema(schema_path)?;
        let analysis = self.analyze_all(&schema)?;
        let report = self.report(&schema, &analysis);

        if let Some(report_path) = &self.config.report_file {
            JsonSerializer::new().serialize_to_file(&report, report_path)?;
            log::info!("Wrote report to {}", report_path.display());
        }

        if !analysis.is_valid() {
            return Ok(RunOutput {
                report,
                rejected: analysis.rejected().max(1),
                written: None,
            });
        }

        let source = schema_path.file_name().and_then(|n| n.to_str());
        let code = self.generate(&schema, &analysis, source)?;
        write_file(&self.config.output_file, &code)?;
        log::info!("Wrote {}", self.config.output_file.display());

        Ok(RunOutput {
            report,
            rejected: 0,
            written: Some(code.len()),
        })
    }
}

/// Result of [`Pipeline::run`].
pub struct RunOutput {
    pub report: SchemaReport,
    pub rejected: usize,
    /// Bytes of generated code, `None` when the schema was rejected.
    pub written: Option<usize>,
}

impl RunOutput {
    pub fn is_generated(&self) -> bool {
        self.written.is_some()
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), PipelineError> {
    fs::write(path, content).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"{
        "layouts": [
            { "name": "Page", "annotation": "size=4096",
              "fields": [
                { "name": "Header", "type": "uint16", "tag": "@0" },
                { "name": "Body", "type": "[]byte", "tag": "start-end" },
                { "name": "Footer", "type": "uint64", "tag": "@4088" }
              ] },
            { "name": "Bad", "annotation": "size=8",
              "fields": [
                { "name": "A", "type": "uint64", "tag": "@0" },
                { "name": "B", "type": "uint32", "tag": "@4" }
              ] },
            { "name": "Small", "annotation": "size=4",
              "fields": [ { "name": "X", "type": "uint32", "tag": "@0" } ] }
        ]
    }"#;

    fn schema(config: &Config) -> Schema {
        Schema::from_json(SCHEMA, config.annotation_defaults()).unwrap()
    }

    #[test]
    fn test_analyze_all_keeps_order() {
        let pipeline = Pipeline::new(Config::new().with_threads(2));
        let schema = schema(pipeline.config());
        let analysis = pipeline.analyze_all(&schema).unwrap();

        let names: Vec<&str> = analysis.layouts.iter().map(|l| l.type_name()).collect();
        assert_eq!(names, vec!["Page", "Bad", "Small"]);
        assert!(!analysis.is_valid());
        assert_eq!(analysis.rejected(), 1);
        assert!(analysis.get("Page").unwrap().is_valid());
    }

    #[test]
    fn test_fail_fast_stops_at_first_rejection() {
        let pipeline = Pipeline::new(Config::new().with_fail_fast(true));
        let schema = schema(pipeline.config());
        let analysis = pipeline.analyze_all(&schema).unwrap();

        assert_eq!(analysis.layouts.len(), 2);
        assert!(analysis.stopped_early);
        assert!(analysis.get("Small").is_none());
    }

    #[test]
    fn test_generate_refuses_rejected_schema() {
        let pipeline = Pipeline::new(Config::new().with_threads(1));
        let schema = schema(pipeline.config());
        let analysis = pipeline.analyze_all(&schema).unwrap();
        assert!(matches!(
            pipeline.generate(&schema, &analysis, None),
            Err(PipelineError::Rejected(1))
        ));

        let report = pipeline.report(&schema, &analysis);
        assert_eq!(report.valid_count(), 2);
        assert_eq!(report.layout("Bad").unwrap().errors[0].kind, "collision");
    }

    #[test]
    fn test_generate_valid_schema() {
        let pipeline = Pipeline::new(Config::new().with_threads(1));
        let schema = Schema::from_json(
            r#"{ "layouts": [ { "name": "Small", "annotation": "size=4",
                "fields": [ { "name": "X", "type": "uint32", "tag": "@0" } ] } ] }"#,
            pipeline.config().annotation_defaults(),
        )
        .unwrap();
        let analysis = pipeline.analyze_all(&schema).unwrap();
        let code = pipeline.generate(&schema, &analysis, Some("small.json")).unwrap();
        assert!(code.contains("pub struct Small {"));
        assert!(code.contains("// Source: small.json"));
    }

    #[test]
    fn test_run_writes_code_and_report() {
        let dir = std::env::temp_dir();
        let schema_path = dir.join(format!("binlayout-run-{}.json", std::process::id()));
        let output = dir.join(format!("binlayout-run-{}.rs", std::process::id()));
        let report_path = dir.join(format!("binlayout-run-{}-report.json", std::process::id()));
        fs::write(
            &schema_path,
            r#"{ "layouts": [ { "name": "Small", "annotation": "size=4",
                "fields": [ { "name": "X", "type": "uint32", "tag": "@0" } ] } ] }"#,
        )
        .unwrap();

        let config = Config::new()
            .with_threads(1)
            .with_output_file(output.clone())
            .with_report_file(report_path.clone());
        let run = Pipeline::new(config).run(&schema_path).unwrap();
        assert!(run.is_generated());
        assert_eq!(run.report.valid_count(), 1);
        assert!(fs::read_to_string(&output).unwrap().contains("impl Small {"));
        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(json["layouts"][0]["name"], "Small");

        for path in [schema_path, output, report_path] {
            fs::remove_file(path).ok();
        }
    }

    #[test]
    fn test_run_rejected_writes_report_only() {
        let dir = std::env::temp_dir();
        let schema_path = dir.join(format!("binlayout-rejected-{}.json", std::process::id()));
        let output = dir.join(format!("binlayout-rejected-{}.rs", std::process::id()));
        let report_path = dir.join(format!("binlayout-rejected-{}-report.json", std::process::id()));
        fs::write(&schema_path, SCHEMA).unwrap();
        fs::remove_file(&output).ok();

        let config = Config::new()
            .with_threads(1)
            .with_output_file(output.clone())
            .with_report_file(report_path.clone());
        let run = Pipeline::new(config).run(&schema_path).unwrap();
        assert!(!run.is_generated());
        assert_eq!(run.rejected, 1);
        assert_eq!(run.report.layout("Bad").unwrap().errors[0].kind, "collision");
        assert!(report_path.exists());
        assert!(!output.exists());

        for path in [schema_path, report_path] {
            fs::remove_file(path).ok();
        }
    }
}
