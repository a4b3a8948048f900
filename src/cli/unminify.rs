use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;

use super::utils::{read_source, source_type, write_output};
use crate::error::{Error as UnminifyError, Result as UnminifyResult};
use crate::transforms::TransformStats;
use crate::unminifier::{Unminified, Unminifier, UnminifyOptions};

/// Arguments for the unminify and check commands
#[derive(Debug, Clone)]
pub struct UnminifyArgs {
    pub inputs: Vec<PathBuf>,
    /// Output file for one input, output directory for several
    pub output_path: Option<PathBuf>,
    pub max_passes: Option<usize>,
    pub strict_leaves: bool,
    pub false_leaves: bool,
    pub no_nullish: bool,
    pub stats: bool,
}

impl UnminifyArgs {
    /// Convert to UnminifyOptions
    pub fn to_options(&self) -> UnminifyOptions {
        UnminifyOptions::from_cli(
            self.max_passes,
            self.strict_leaves,
            self.false_leaves,
            self.no_nullish,
        )
    }
}

/// Statistics of one input file
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: String,
    #[serde(flatten)]
    pub stats: TransformStats,
}

/// Statistics of a whole run
#[derive(Debug, Serialize)]
pub struct Report {
    pub files: Vec<FileReport>,
    pub total: TransformStats,
}

impl Report {
    fn new(results: &[(PathBuf, Unminified)]) -> Self {
        let mut total = TransformStats {
            converged: true,
            ..TransformStats::default()
        };
        let files = results
            .iter()
            .map(|(path, unminified)| {
                total.merge(&unminified.stats);
                FileReport {
                    path: path.display().to_string(),
                    stats: unminified.stats.clone(),
                }
            })
            .collect();
        Self { files, total }
    }

    fn to_json(&self) -> UnminifyResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| UnminifyError::internal(format!("Failed to serialize statistics: {}", e)))
    }
}

/// Unminify every input in parallel, keeping the input order
fn process(args: &UnminifyArgs) -> UnminifyResult<Vec<(PathBuf, Unminified)>> {
    let unminifier = Unminifier::new(args.to_options());
    args.inputs
        .par_iter()
        .map(|path| -> UnminifyResult<(PathBuf, Unminified)> {
            let source = read_source(path)?;
            let result = unminifier.unminify_with_source_type(&source, source_type(path)?)?;
            log::debug!(
                "{}: {} rewrites",
                path.display(),
                result.stats.rewrites()
            );
            Ok((path.clone(), result))
        })
        .collect()
}

fn output_file(directory: &Path, input: &Path) -> UnminifyResult<PathBuf> {
    let name = input.file_name().ok_or_else(|| {
        UnminifyError::internal(format!("Input has no file name: {}", input.display()))
    })?;
    Ok(directory.join(name))
}

/// Run the unminify subcommand
pub fn unminify(args: &UnminifyArgs) -> UnminifyResult<()> {
    let results = process(args)?;

    match (&args.output_path, results.as_slice()) {
        (Some(path), [(_, single)]) if !path.is_dir() => {
            write_output(&single.code, Some(path.as_path()))?;
        }
        (Some(directory), _) => {
            std::fs::create_dir_all(directory)?;
            for (input, unminified) in &results {
                let path = output_file(directory, input)?;
                write_output(&unminified.code, Some(path.as_path()))?;
            }
        }
        (None, _) => {
            for (_, unminified) in &results {
                write_output(&unminified.code, None)?;
            }
        }
    }

    if args.stats {
        eprintln!("{}", Report::new(&results).to_json()?);
    }
    Ok(())
}

/// Run the check subcommand: report what would change without writing
pub fn check(args: &UnminifyArgs) -> UnminifyResult<()> {
    let results = process(args)?;
    println!("{}", Report::new(&results).to_json()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_totals() {
        let stats = |chains, converged| TransformStats {
            optional_chains: chains,
            passes: 2,
            converged,
            ..TransformStats::default()
        };
        let results = vec![
            (
                PathBuf::from("a.js"),
                Unminified {
                    code: String::new(),
                    stats: stats(2, true),
                },
            ),
            (
                PathBuf::from("b.js"),
                Unminified {
                    code: String::new(),
                    stats: stats(1, false),
                },
            ),
        ];
        let report = Report::new(&results);
        assert_eq!(report.total.optional_chains, 3);
        assert!(!report.total.converged);

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["files"][0]["path"], "a.js");
        assert_eq!(json["files"][1]["optional_chains"], 1);
    }

    #[test]
    fn test_output_file_keeps_name() {
        let path = output_file(Path::new("out"), Path::new("src/app.js")).unwrap();
        assert_eq!(path, PathBuf::from("out/app.js"));
    }
}
