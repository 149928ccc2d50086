//! Where scripts, logs and artifacts live on disk

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::dataset::DatasetDescriptor;
use crate::error::{Error, Result};
use crate::job::artifact::Stage;
use crate::variable::TargetVariable;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PathKind {
    Input,
    Output,
    Tmp,
    Scripts,
    Logs,
}

/// Base directories, one per [PathKind]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub tmp_dir: PathBuf,
    pub script_dir: PathBuf,
    pub log_dir: PathBuf,
}

pub trait PathManager {
    fn base(&self, kind: PathKind) -> &Path;

    fn dataset_dir(&self, kind: PathKind, dataset: &str) -> PathBuf {
        self.base(kind).join(dataset)
    }

    /// Location of a variable's artifact at a stage
    ///
    /// Raw data lives wherever the dataset keeps it; produced artifacts are named after the
    /// variable's output name.
    fn artifact_path(&self, dataset: &dyn DatasetDescriptor, target: &TargetVariable, stage: Stage) -> Result<PathBuf> {
        let name = &target.name;
        let path = match stage {
            Stage::Raw => return dataset.input_dir(&target.id),
            Stage::Preprocessed => self
                .dataset_dir(PathKind::Tmp, dataset.name())
                .join(format!("{name}_preprocessed")),
            Stage::Timeseries => self
                .dataset_dir(PathKind::Output, dataset.name())
                .join(format!("{name}_timeseries.nc")),
            Stage::Rechunked => self
                .dataset_dir(PathKind::Output, dataset.name())
                .join(format!("{name}_rechunked.nc")),
        };
        Ok(path)
    }

    fn submission_script(&self, dataset: &str) -> PathBuf {
        self.dataset_dir(PathKind::Scripts, dataset).join("submit.sh")
    }

    fn wrapper_script(&self) -> PathBuf {
        self.base(PathKind::Scripts).join("submit_all.sh")
    }

    /// PBS `-l storage` entries needed to access a set of paths
    fn storage_directives(&self, paths: &[&Path]) -> Vec<String>;

    /// Create the directories jobs of a dataset write into
    fn create_directories(&self, dataset: &str) -> Result<()>;
}

/// Path manager for a Gadi style filesystem (`/g/data/<project>`, `/scratch/<project>`)
#[derive(Debug)]
pub struct FsPathManager {
    config: PathsConfig,
    extra_storage: Vec<String>,
    create: bool,
}

impl FsPathManager {
    /// `create` is false for dry runs, so nothing is made on disk
    pub fn new(config: PathsConfig, extra_storage: Vec<String>, create: bool) -> Self {
        FsPathManager { config, extra_storage, create }
    }
}

impl PathManager for FsPathManager {
    fn base(&self, kind: PathKind) -> &Path {
        match kind {
            PathKind::Input => &self.config.input_dir,
            PathKind::Output => &self.config.output_dir,
            PathKind::Tmp => &self.config.tmp_dir,
            PathKind::Scripts => &self.config.script_dir,
            PathKind::Logs => &self.config.log_dir,
        }
    }

    fn storage_directives(&self, paths: &[&Path]) -> Vec<String> {
        let mut directives: BTreeSet<String> = self.extra_storage.iter().cloned().collect();
        directives.extend(paths.iter().filter_map(|p| storage_for(p)));
        directives.into_iter().collect()
    }

    fn create_directories(&self, dataset: &str) -> Result<()> {
        if !self.create {
            return Ok(());
        }
        for kind in [PathKind::Output, PathKind::Tmp, PathKind::Scripts, PathKind::Logs] {
            let dir = self.dataset_dir(kind, dataset);
            if !dir.exists() {
                info!("Creating directory {}", dir.display());
            }
            fs::create_dir_all(&dir).map_err(|err| Error::io(&dir, err))?;
        }
        Ok(())
    }
}

fn storage_for(path: &Path) -> Option<String> {
    let parts: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    if !path.is_absolute() {
        return None;
    }
    match parts.as_slice() {
        ["g", "data", project, ..] => Some(format!("gdata/{project}")),
        ["scratch", project, ..] => Some(format!("scratch/{project}")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::dataset::{Dataset, DatasetVariable};
    use crate::variable::Aggregation;

    fn dataset(path: Option<PathBuf>) -> Dataset {
        let mut variables = BTreeMap::new();
        variables.insert(
            "Temperature".into(),
            DatasetVariable { name: "temp".into(), units: "K".into(), path, unpack: false },
        );
        Dataset {
            name: "TestDataset".into(),
            input_dir: PathBuf::from("/g/data/ef56/station"),
            timestep_hours: 24,
            variables,
        }
    }

    fn temperature() -> TargetVariable {
        TargetVariable {
            id: "Temperature".into(),
            name: "tas".into(),
            units: "degC".into(),
            aggregation: Aggregation::Mean,
            derive: None,
        }
    }

    fn manager(extra: Vec<String>) -> FsPathManager {
        let config = PathsConfig {
            input_dir: PathBuf::from("/g/data/ab12/raw"),
            output_dir: PathBuf::from("/scratch/cd34/out"),
            tmp_dir: PathBuf::from("/scratch/cd34/tmp"),
            script_dir: PathBuf::from("/home/user/scripts"),
            log_dir: PathBuf::from("/home/user/logs"),
        };
        FsPathManager::new(config, extra, false)
    }

    #[test]
    fn timeseries_lives_in_dataset_output_dir() {
        let paths = manager(vec![]);
        let ds = dataset(None);
        assert_eq!(
            paths.artifact_path(&ds, &temperature(), Stage::Timeseries).unwrap(),
            PathBuf::from("/scratch/cd34/out/TestDataset/tas_timeseries.nc")
        );
        assert_eq!(
            paths.artifact_path(&ds, &temperature(), Stage::Preprocessed).unwrap(),
            PathBuf::from("/scratch/cd34/tmp/TestDataset/tas_preprocessed")
        );
    }

    #[test]
    fn raw_data_follows_the_dataset_layout() {
        let paths = manager(vec![]);
        // dataset input_dir and the input name, not paths.input_dir and the output name
        assert_eq!(
            paths.artifact_path(&dataset(None), &temperature(), Stage::Raw).unwrap(),
            PathBuf::from("/g/data/ef56/station/temp")
        );
        let overridden = dataset(Some(PathBuf::from("/g/data/ef56/t2m")));
        assert_eq!(
            paths.artifact_path(&overridden, &temperature(), Stage::Raw).unwrap(),
            PathBuf::from("/g/data/ef56/t2m")
        );
    }

    #[test]
    fn storage_is_derived_from_paths_and_deduplicated() {
        let paths = manager(vec!["gdata/hh5".to_string()]);
        let directives = paths.storage_directives(&[
            Path::new("/g/data/ab12/raw/x"),
            Path::new("/scratch/cd34/out/y.nc"),
            Path::new("/scratch/cd34/tmp/z"),
            Path::new("/home/user/scripts/a.sh"),
        ]);
        assert_eq!(directives, vec!["gdata/ab12", "gdata/hh5", "scratch/cd34"]);
    }

    #[test]
    fn dry_run_creates_nothing() {
        let paths = manager(vec![]);
        paths.create_directories("TestDataset").unwrap();
        assert!(!Path::new("/scratch/cd34/out/TestDataset").exists());
    }
}
