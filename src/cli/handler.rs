// Tue Jan 13 2026 - Alex

use super::args::{AnalyzeArgs, Args, CheckArgs, Command, GenerateArgs};
use crate::config::Config;
use crate::layout::{Endian, ModeKind};
use crate::output::{JsonSerializer, LayoutReport, ReportFormat, ReportGenerator, SchemaReport};
use crate::pipeline::{Analysis, Pipeline};
use crate::utils::{format_bytes, format_duration, pluralize};
use anyhow::{anyhow, Context};
use colored::Colorize;
use std::time::Instant;

pub struct CommandHandler {
    config: Config,
}

impl CommandHandler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Loads `--config` when given, otherwise the defaults.
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        let config = match &args.config {
            Some(path) => {
                Config::load(path).with_context(|| format!("Failed to load config {}", path.display()))?
            }
            None => Config::default(),
        };
        Ok(Self::new(config))
    }

    pub fn execute(self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Generate(args) => self.handle_generate(args),
            Command::Check(args) => self.handle_check(args),
            Command::Analyze(args) => self.handle_analyze(args),
        }
    }

    fn handle_generate(mut self, args: GenerateArgs) -> anyhow::Result<()> {
        args.validate().map_err(|e| anyhow!(e))?;

        if let Some(output) = args.output {
            self.config = self.config.with_output_file(output);
        }
        if let Some(report) = args.report {
            self.config = self.config.with_report_file(report);
        }
        if let Some(endian) = args.endian.as_deref().and_then(Endian::parse) {
            self.config = self.config.with_default_endian(endian);
        }
        if let Some(mode) = args.mode.as_deref() {
            let mode = if mode == "zerocopy" { ModeKind::ZeroCopy } else { ModeKind::Copy };
            self.config = self.config.with_default_mode(mode);
        }
        if let Some(threads) = args.threads {
            self.config = self.config.with_threads(threads);
        }
        if args.fail_fast {
            self.config = self.config.with_fail_fast(true);
        }
        self.config.validate()?;

        println!("{} Compiling {}", "[*]".blue(), args.schema.display());
        let start = Instant::now();
        let pipeline = Pipeline::new(self.config);
        let run = pipeline.run(&args.schema)?;

        if let Some(path) = &pipeline.config().report_file {
            println!("{} Report written to {}", "[+]".green(), path.display());
        }

        let Some(written) = run.written else {
            print_errors(&run.report);
            return Err(anyhow!(
                "{} rejected, nothing generated",
                pluralize(run.rejected, "layout", "layouts")
            ));
        };

        println!(
            "{} Generated {} in {}",
            "[+]".green(),
            pluralize(run.report.layouts.len(), "layout", "layouts"),
            format_duration(start.elapsed())
        );
        println!(
            "{} Output written to {} ({})",
            "[+]".green(),
            pipeline.config().output_file.display(),
            format_bytes(written as u64)
        );
        Ok(())
    }

    fn handle_check(self, args: CheckArgs) -> anyhow::Result<()> {
        let config = self.config.with_fail_fast(args.fail_fast);
        let pipeline = Pipeline::new(config);
        let schema = pipeline.load_schema(&args.schema)?;
        let analysis = pipeline.analyze_all(&schema)?;
        let report = pipeline.report(&schema, &analysis);

        for layout in &report.layouts {
            if layout.valid {
                println!("{} {} ({} bytes)", "[+]".green(), layout.name, layout.buffer_size);
            }
        }
        print_errors(&report);
        print_skipped(&analysis, schema.layouts().len());

        if analysis.is_valid() {
            println!("{} All layouts valid", "[+]".green());
            Ok(())
        } else {
            Err(anyhow!(
                "{} failed analysis",
                pluralize(analysis.rejected(), "layout", "layouts")
            ))
        }
    }

    fn handle_analyze(self, args: AnalyzeArgs) -> anyhow::Result<()> {
        args.validate().map_err(|e| anyhow!(e))?;

        let pipeline = Pipeline::new(self.config);
        let schema = pipeline.load_schema(&args.schema)?;
        let analysis = pipeline.analyze_all(&schema)?;
        let mut report = pipeline.report(&schema, &analysis);

        if let Some(name) = &args.type_name {
            let layout: LayoutReport = report
                .layout(name)
                .cloned()
                .ok_or_else(|| anyhow!("Layout not found: {}", name))?;
            report.layouts = vec![layout];
        }

        if args.json {
            println!("{}", JsonSerializer::new().serialize(&report)?);
        } else {
            let format = if args.markdown { ReportFormat::Markdown } else { ReportFormat::Text };
            print!("{}", ReportGenerator::new(format).generate(&report));
        }
        Ok(())
    }
}

fn print_errors(report: &SchemaReport) {
    for layout in report.layouts.iter().filter(|l| !l.valid) {
        eprintln!(
            "{} {}: {}",
            "[!]".red(),
            layout.name.bold(),
            pluralize(layout.errors.len(), "error", "errors")
        );
        for error in &layout.errors {
            eprintln!("    {} {}", format!("[{}]", error.kind).yellow(), error.message);
        }
    }
}

fn print_skipped(analysis: &Analysis, total: usize) {
    if analysis.stopped_early {
        let skipped = total - analysis.layouts.len();
        eprintln!(
            "{} Skipped {} after the first failure",
            "[!]".yellow(),
            pluralize(skipped, "layout", "layouts")
        );
    }
}
