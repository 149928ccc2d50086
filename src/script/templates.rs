use std::path::{Path, PathBuf};

use chrono::Utc;
use log::debug;
use serde::Serialize;
use tinytemplate::{format_unescaped, TinyTemplate};

use crate::config::SchedulerConfig;
use crate::error::{Error, Result};
use crate::job::task::{DeriveOptions, MergeOptions, PreprocessOptions, RechunkOptions};
use crate::script::writer::ScriptWriter;
use crate::script::{HeaderWriter, ScriptGenerator, Submission, SubmissionWriter};

/// included templates, shell text with TinyTemplate placeholders
static HEADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/header.txt"));
static PREPROCESS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/preprocess.txt"));
static MERGE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/merge.txt"));
static RECHUNK: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/rechunk.txt"));
static DERIVE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/derive.txt"));
static SUBMIT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/submit.txt"));
static WRAPPER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/wrapper.txt"));

/// Renders every script the generator writes
///
/// Output is not HTML escaped: the templates produce shell, and values such as units
/// (`kg m-2 s-1`) or paths must appear verbatim.
pub struct Templates {
    tt: TinyTemplate<'static>,
    scheduler: SchedulerConfig,
}

impl Templates {
    pub fn new(scheduler: SchedulerConfig) -> Result<Self> {
        let mut tt = TinyTemplate::new();
        tt.set_default_formatter(&format_unescaped);
        for (name, text) in [
            ("header", HEADER),
            ("preprocess", PREPROCESS),
            ("merge", MERGE),
            ("rechunk", RECHUNK),
            ("derive", DERIVE),
            ("submit", SUBMIT),
            ("wrapper", WRAPPER),
        ] {
            tt.add_template(name, text)
                .map_err(|source| Error::Render { template: name, source })?;
        }
        Ok(Templates { tt, scheduler })
    }

    fn render<C: Serialize>(&self, template: &'static str, context: &C, out: &mut ScriptWriter) -> Result<()> {
        debug!("Rendering {} template into {}", template, out.path().display());
        let text = self
            .tt
            .render(template, context)
            .map_err(|source| Error::Render { template, source })?;
        out.write_str(&text)
    }
}

/// Rendering context for the PBS header
#[derive(Serialize)]
struct HeaderContext<'a> {
    job_name: &'a str,
    project: &'a str,
    queue: String,
    walltime: &'a str,
    ncpus: u32,
    memory: &'a str,
    jobfs: Option<&'a str>,
    storage: String,
    email: Option<&'a str>,
    log_path: String,
    modules: &'a [String],
}

impl HeaderWriter for Templates {
    fn write_header(&self, out: &mut ScriptWriter, job_name: &str, log_path: &Path, storage: &[String]) -> Result<()> {
        let s = &self.scheduler;
        let context = HeaderContext {
            job_name,
            project: &s.project,
            queue: s.queue.to_string(),
            walltime: &s.walltime,
            ncpus: s.ncpus,
            memory: &s.memory,
            jobfs: s.jobfs.as_deref(),
            storage: storage.join("+"),
            email: s.email.as_deref(),
            log_path: log_path.display().to_string(),
            modules: &s.modules,
        };
        self.render("header", &context, out)
    }
}

/// Rendering context for unpacking
#[derive(Serialize)]
struct PreprocessContext {
    variable: String,
    input_dir: String,
    output_dir: String,
}

impl ScriptGenerator<PreprocessOptions> for Templates {
    fn write_body(&self, out: &mut ScriptWriter, options: &PreprocessOptions) -> Result<()> {
        let context = PreprocessContext {
            variable: options.variable.name.clone(),
            input_dir: options.input_dir.display().to_string(),
            output_dir: options.output_dir.display().to_string(),
        };
        self.render("preprocess", &context, out)
    }
}

/// Rendering context for merging
#[derive(Serialize)]
struct MergeContext {
    input_dir: String,
    output_file: String,
    input_name: String,
    output_name: String,
    output_units: String,
    rename: bool,
    conversion: Vec<String>,
    aggregate: bool,
    aggregation: &'static str,
    remap_grid: Option<String>,
    interpolation: String,
    pack: bool,
    compression: Option<u8>,
}

impl ScriptGenerator<MergeOptions> for Templates {
    fn write_body(&self, out: &mut ScriptWriter, options: &MergeOptions) -> Result<()> {
        let context = MergeContext {
            input_dir: options.input_dir.display().to_string(),
            output_file: options.output_file.display().to_string(),
            input_name: options.input.name.clone(),
            output_name: options.output.name.clone(),
            output_units: options.output.units.clone(),
            rename: options.input.name != options.output.name,
            conversion: options.conversion.clone(),
            // output is always daily
            aggregate: options.timestep_hours < 24,
            aggregation: options.aggregation.as_str(),
            remap_grid: options.remap_grid.as_ref().map(|p| p.display().to_string()),
            interpolation: options.interpolation.to_string(),
            pack: options.pack,
            compression: options.compression_level,
        };
        self.render("merge", &context, out)
    }
}

/// Rendering context for rechunking
#[derive(Serialize)]
struct RechunkContext {
    variable: String,
    input_file: String,
    output_file: String,
    time: u32,
    lat: u32,
    lon: u32,
    compression: Option<u8>,
}

impl ScriptGenerator<RechunkOptions> for Templates {
    fn write_body(&self, out: &mut ScriptWriter, options: &RechunkOptions) -> Result<()> {
        let context = RechunkContext {
            variable: options.variable.clone(),
            input_file: options.input_file.display().to_string(),
            output_file: options.output_file.display().to_string(),
            time: options.chunking.time,
            lat: options.chunking.lat,
            lon: options.chunking.lon,
            compression: options.compression_level,
        };
        self.render("rechunk", &context, out)
    }
}

/// Rendering context for derived variables
#[derive(Serialize)]
struct DeriveContext {
    inputs: Vec<String>,
    output_file: String,
    output_name: String,
    output_units: String,
    expression: String,
    compression: Option<u8>,
}

impl ScriptGenerator<DeriveOptions> for Templates {
    fn write_body(&self, out: &mut ScriptWriter, options: &DeriveOptions) -> Result<()> {
        let context = DeriveContext {
            inputs: options.input_files.iter().map(|p| p.display().to_string()).collect(),
            output_file: options.output_file.display().to_string(),
            output_name: options.output.name.clone(),
            output_units: options.output.units.clone(),
            expression: options.expression.clone(),
            compression: options.compression_level,
        };
        self.render("derive", &context, out)
    }
}

#[derive(Serialize)]
struct SubmissionEntry {
    name: String,
    script: String,
    capture: String,
    after: String,
}

/// Rendering context for a dataset's submission script
#[derive(Serialize)]
struct SubmitContext<'a> {
    dataset: &'a str,
    jobs: Vec<SubmissionEntry>,
}

/// Rendering context for the wrapper
#[derive(Serialize)]
struct WrapperContext {
    generated: String,
    scripts: Vec<String>,
    output_dir: String,
    wrapper: String,
}

impl SubmissionWriter for Templates {
    fn write_submission(&self, out: &mut ScriptWriter, dataset: &str, submissions: &[Submission]) -> Result<()> {
        let jobs = submissions
            .iter()
            .map(|s| SubmissionEntry {
                name: s.job_name.clone(),
                script: s.script.display().to_string(),
                capture: s.capture.clone(),
                after: s.after.iter().map(|c| format!("${c}")).collect::<Vec<_>>().join(":"),
            })
            .collect();
        self.render("submit", &SubmitContext { dataset, jobs }, out)
    }

    fn write_wrapper(&self, out: &mut ScriptWriter, scripts: &[PathBuf], output_dir: &Path) -> Result<()> {
        let context = WrapperContext {
            generated: Utc::now().to_rfc3339(),
            scripts: scripts.iter().map(|p| p.display().to_string()).collect(),
            output_dir: output_dir.display().to_string(),
            wrapper: out.path().display().to_string(),
        };
        self.render("wrapper", &context, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Chunking;
    use crate::queue::Queue;
    use crate::script::writer::{MemoryWriterFactory, WriterFactory};
    use crate::variable::interpolation::Interpolation;
    use crate::variable::{Aggregation, VariableMeta};

    fn scheduler() -> SchedulerConfig {
        SchedulerConfig {
            project: "ab12".to_string(),
            queue: Queue::Express,
            walltime: "02:00:00".to_string(),
            ncpus: 2,
            memory: "16GB".to_string(),
            jobfs: None,
            storage: vec![],
            email: Some("ops@example.org".to_string()),
            modules: vec!["cdo".to_string(), "nco".to_string()],
        }
    }

    fn render_with<F>(write: F) -> String
    where
        F: FnOnce(&Templates, &mut ScriptWriter) -> Result<()>,
    {
        let templates = Templates::new(scheduler()).unwrap();
        let factory = MemoryWriterFactory::new();
        let path = Path::new("/scripts/out.sh");
        let mut writer = factory.create(path).unwrap();
        write(&templates, &mut writer).unwrap();
        writer.finish().unwrap();
        factory.get(path).unwrap()
    }

    fn merge_options() -> MergeOptions {
        MergeOptions {
            input_dir: PathBuf::from("/in/TestDataset/temp"),
            output_file: PathBuf::from("/out/TestDataset/tas_timeseries.nc"),
            input: VariableMeta::new("temp", "K"),
            output: VariableMeta::new("tas", "degC"),
            conversion: vec!["-subc,273.15".to_string()],
            timestep_hours: 3,
            aggregation: Aggregation::Max,
            remap_grid: None,
            interpolation: Interpolation::Bilinear,
            pack: false,
            compression_level: Some(5),
        }
    }

    #[test]
    fn header_has_pbs_directives() {
        let text = render_with(|t, w| {
            t.write_header(w, "mergetime_tas_TestDataset", Path::new("/logs/a.log"), &["gdata/ab12".to_string(), "scratch/ab12".to_string()])
        });
        assert!(text.starts_with("#!/bin/bash\n"));
        assert!(text.contains("#PBS -N mergetime_tas_TestDataset\n"));
        assert!(text.contains("#PBS -q express\n"));
        assert!(text.contains("#PBS -l storage=gdata/ab12+scratch/ab12\n"));
        assert!(text.contains("#PBS -M ops@example.org\n"));
        assert!(!text.contains("jobfs"));
        assert!(text.contains("set -euo pipefail\n"));
        assert!(text.contains("module load nco\n"));
    }

    #[test]
    fn merge_renames_converts_and_aggregates() {
        let text = render_with(|t, w| t.write_body(w, &merge_options()));
        assert!(text.contains("-z zip_5"));
        assert!(text.contains("-daymax"));
        assert!(text.contains("-subc,273.15"));
        assert!(text.contains("-chname,temp,tas"));
        assert!(text.contains("-setattribute,tas@units=\"degC\""));
        assert!(!text.contains("-remap"));
        assert!(text.contains("OUT_FILE=\"/out/TestDataset/tas_timeseries.nc\""));
    }

    #[test]
    fn merge_remaps_when_a_grid_is_given() {
        let mut options = merge_options();
        options.remap_grid = Some(PathBuf::from("/grids/half_degree.txt"));
        options.interpolation = Interpolation::Conservative;
        let text = render_with(|t, w| t.write_body(w, &options));
        assert!(text.contains("-remapcon,\"/grids/half_degree.txt\""));
    }

    #[test]
    fn rechunk_uses_given_variable_name() {
        let options = RechunkOptions {
            input_file: PathBuf::from("/out/tas_timeseries.nc"),
            output_file: PathBuf::from("/out/tas_rechunked.nc"),
            variable: "tas".to_string(),
            chunking: Chunking { time: 365, lat: 10, lon: 10 },
            compression_level: None,
        };
        let text = render_with(|t, w| t.write_body(w, &options));
        assert!(text.contains("-c \"time/365,lat/10,lon/10\""));
        assert!(text.contains("-V tas,time,lat,lon"));
        assert!(!text.contains("-d "));
    }

    #[test]
    fn submission_captures_ids_and_waits_for_dependencies() {
        let submissions = vec![
            Submission {
                job_name: "preprocessing_tas_D".to_string(),
                script: PathBuf::from("/s/preprocessing_tas_D.sh"),
                capture: "JOB_1".to_string(),
                after: vec![],
            },
            Submission {
                job_name: "mergetime_tas_D".to_string(),
                script: PathBuf::from("/s/mergetime_tas_D.sh"),
                capture: "JOB_2".to_string(),
                after: vec!["JOB_1".to_string()],
            },
        ];
        let text = render_with(|t, w| t.write_submission(w, "D", &submissions));
        assert!(text.contains("set -euo pipefail"));
        assert!(text.contains("JOB_1=$(qsub \"/s/preprocessing_tas_D.sh\")\n"));
        assert!(text.contains("JOB_2=$(qsub -W depend=afterok:$JOB_1 \"/s/mergetime_tas_D.sh\")\n"));
        assert!(text.contains("echo \"mergetime_tas_D: $JOB_2\""));
    }

    #[test]
    fn wrapper_calls_scripts_in_order() {
        let scripts = vec![PathBuf::from("/s/A/submit.sh"), PathBuf::from("/s/B/submit.sh")];
        let text = render_with(|t, w| t.write_wrapper(w, &scripts, Path::new("/out")));
        let a = text.find("bash \"/s/A/submit.sh\"").unwrap();
        let b = text.find("bash \"/s/B/submit.sh\"").unwrap();
        assert!(a < b);
        assert!(text.contains("echo \"Output directory: /out\""));
        assert!(text.contains("echo \"Submission wrapper: /scripts/out.sh\""));
    }
}
