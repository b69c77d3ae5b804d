// Summary command - count what a results directory holds

use anyhow::{Result, bail};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::cli::{OutputFormat, SummaryArgs};
use crate::config::Config;
use crate::store::ResultsReader;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct Summary {
    pub results: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_stage: BTreeMap<String, usize>,
    pub containers: usize,
    pub fixtures: usize,
    pub attachments: usize,
    pub unreadable: Vec<String>,
}

impl Summary {
    pub fn collect(dir: &Path) -> Self {
        let mut reader = ResultsReader::new(dir);
        let results = reader.read_test_results();
        let containers = reader.read_containers();
        let attachments = reader.find_attachments();

        let mut summary = Summary {
            results: results.len(),
            containers: containers.len(),
            fixtures: containers
                .iter()
                .map(|c| c.befores.len() + c.afters.len())
                .sum(),
            attachments: attachments.len(),
            ..Default::default()
        };
        for result in &results {
            let status = result.status.map(|s| s.as_str()).unwrap_or(UNKNOWN);
            let stage = result.stage.map(|s| s.as_str()).unwrap_or(UNKNOWN);
            *summary.by_status.entry(status.to_string()).or_default() += 1;
            *summary.by_stage.entry(stage.to_string()).or_default() += 1;
        }
        for error in reader.errors() {
            warn!("Skipped {}: {}", error.path.display(), error.message);
            summary
                .unreadable
                .push(error.path.to_string_lossy().to_string());
        }
        summary
    }

    fn print_text(&self, dir: &Path) {
        println!("Results directory: {}", dir.display());
        println!("  Test results: {}", self.results);
        for (status, count) in &self.by_status {
            println!("    {:<10} {}", status, count);
        }
        println!("  Stages:");
        for (stage, count) in &self.by_stage {
            println!("    {:<10} {}", stage, count);
        }
        println!("  Containers: {} ({} fixtures)", self.containers, self.fixtures);
        println!("  Attachments: {}", self.attachments);
        if !self.unreadable.is_empty() {
            println!("  Unreadable files: {}", self.unreadable.len());
            for path in &self.unreadable {
                println!("    {}", path);
            }
        }
    }
}

pub fn handle_summary(args: &SummaryArgs, config: &Config) -> Result<()> {
    let dir = args
        .dir
        .clone()
        .unwrap_or_else(|| config.results.directory.clone());

    if !dir.is_dir() {
        bail!("Results directory not found: {}", dir.display());
    }
    debug!("Summarizing {}", dir.display());

    let summary = Summary::collect(&dir);
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => summary.print_text(&dir),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FixtureResult, Stage, Status, TestResult, TestResultContainer};
    use crate::store::{FileSystemStore, ResultStore};
    use tempfile::TempDir;

    #[test]
    fn test_collect_counts_by_status_and_stage() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileSystemStore::new(temp_dir.path());
        let mut passed = TestResult::new("a").with_status(Status::Passed);
        passed.stage = Some(Stage::Finished);
        store.write_test_result(&passed).unwrap();
        store.write_test_result(&TestResult::new("b")).unwrap();
        let mut container = TestResultContainer::new("c").with_child("a");
        container.befores.push(FixtureResult::named("setup"));
        store.write_container(&container).unwrap();
        store
            .write_attachment("x-attachment.txt", &mut "log".as_bytes())
            .unwrap();
        std::fs::write(temp_dir.path().join("broken-result.json"), "{").unwrap();

        let summary = Summary::collect(temp_dir.path());

        assert_eq!(summary.results, 2);
        assert_eq!(summary.by_status.get("passed"), Some(&1));
        assert_eq!(summary.by_status.get("unknown"), Some(&1));
        assert_eq!(summary.by_stage.get("finished"), Some(&1));
        assert_eq!(summary.containers, 1);
        assert_eq!(summary.fixtures, 1);
        assert_eq!(summary.attachments, 1);
        assert_eq!(summary.unreadable.len(), 1);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let args = SummaryArgs {
            dir: Some("/definitely/not/here".into()),
            format: OutputFormat::Text,
        };
        assert!(handle_summary(&args, &Config::default()).is_err());
    }
}
