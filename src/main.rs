//! droid-lint CLI - static analysis for Android projects
//!
//! Scans project directories or individual files and reports the findings
//! as text on stdout, or as HTML and XML reports.

use anyhow::Context as _;
use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use droid_lint::config::LintConfig;
use droid_lint::output::{
    create_output, prepare_output, wrap, HtmlReporter, MultiProjectHtmlReporter, TextReporter,
    UrlMap, XmlReporter,
};
use droid_lint::{
    CliClient, DriverOptions, Issue, IssueRegistry, LintDriver, LintEvent, LintListener,
    LintOptions, LintResult, ReportError, Reporter, ERRNO_ERRORS, ERRNO_EXISTS, ERRNO_HELP,
    ERRNO_INVALIDARGS, ERRNO_USAGE,
};
use glob::glob;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;

/// Column explanations are wrapped at
const WRAP_WIDTH: usize = 70;

#[derive(Parser)]
#[command(
    name = "droid-lint",
    version,
    about = "Android Lint",
    long_about = "Static analysis for Android projects: checks the manifest, XML resources and ProGuard configuration."
)]
struct Cli {
    /// Project directories or files to check (glob patterns accepted)
    files: Vec<String>,

    /// Enable the given issues or categories (comma-separated)
    #[arg(long, value_delimiter = ',')]
    enable: Vec<String>,

    /// Disable the given issues or categories (comma-separated)
    #[arg(long, value_delimiter = ',', visible_aliases = ["ignore", "suppress"])]
    disable: Vec<String>,

    /// Only check the given issues or categories (comma-separated)
    #[arg(long, value_delimiter = ',')]
    check: Vec<String>,

    /// List the available issue ids, optionally only those of a category
    #[arg(long, num_args = 0..=1, default_missing_value = "", value_name = "CATEGORY")]
    list: Option<String>,

    /// Show the explanation of the given issues, or of all issues
    #[arg(long, num_args = 0.., value_delimiter = ',', value_name = "IDS")]
    show: Option<Vec<String>>,

    /// Write an HTML report to a file, or one report per project into a directory
    #[arg(long, value_name = "FILE")]
    html: Option<PathBuf>,

    /// Write a simple HTML report without scripts or bundled images
    #[arg(long, value_name = "FILE")]
    simplehtml: Option<PathBuf>,

    /// Write an XML report
    #[arg(long, value_name = "FILE")]
    xml: Option<PathBuf>,

    /// Map local path prefixes to URLs in HTML reports (prefix=url,...; "none" disables)
    #[arg(long, value_name = "MAP")]
    url: Option<String>,

    /// Show absolute paths
    #[arg(long, visible_alias = "fullpaths")]
    fullpath: bool,

    /// Do not include source lines in the output
    #[arg(long)]
    nolines: bool,

    /// Do not show progress
    #[arg(long)]
    quiet: bool,

    /// Configuration file with severity overrides
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Whether the command line held no arguments at all
    fn is_bare(&self) -> bool {
        self.files.is_empty()
            && self.enable.is_empty()
            && self.disable.is_empty()
            && self.check.is_empty()
            && self.list.is_none()
            && self.show.is_none()
            && self.html.is_none()
            && self.simplehtml.is_none()
            && self.xml.is_none()
            && self.url.is_none()
            && self.config.is_none()
            && !(self.fullpath || self.nolines || self.quiet || self.verbose)
    }
}

/// Prints a dot per scanned file to stderr
struct ProgressListener {
    files: usize,
}

impl LintListener for ProgressListener {
    fn update(&mut self, event: &LintEvent) {
        match event {
            LintEvent::ScanningFile(_) => {
                self.files += 1;
                eprint!(".");
            }
            LintEvent::Canceled | LintEvent::Completed if self.files > 0 => {
                eprintln!();
            }
            _ => {}
        }
    }
}

/// A report requested on the command line
enum Target {
    Html { path: PathBuf, simple: bool },
    MultiHtml { dir: PathBuf },
    Xml { path: PathBuf },
}

/// A requested report whose output file is already open
enum Output {
    Html {
        path: PathBuf,
        simple: bool,
        out: Box<dyn Write>,
    },
    MultiHtml {
        dir: PathBuf,
    },
    Xml {
        path: PathBuf,
        out: Box<dyn Write>,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp => ERRNO_HELP,
                ErrorKind::DisplayVersion => 0,
                ErrorKind::MissingRequiredArgument
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ERRNO_USAGE,
                _ => ERRNO_INVALIDARGS,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let code = match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}: {:#}", "error".red().bold(), err);
            ERRNO_ERRORS
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let registry = Arc::new(IssueRegistry::builtin());

    if let Some(category) = &cli.list {
        list_issues(&registry, category);
        return Ok(0);
    }
    if let Some(ids) = &cli.show {
        return Ok(show_issues(&registry, ids));
    }

    if cli.files.is_empty() {
        eprintln!("{}: No files to analyze", "error".red().bold());
        eprintln!();
        eprintln!("Usage: droid-lint [OPTIONS] <FILES>...");
        eprintln!();
        eprintln!("For more information, try '--help'");
        return Ok(if cli.is_bare() {
            ERRNO_USAGE
        } else {
            ERRNO_INVALIDARGS
        });
    }

    let options = match LintOptions::from_flags(&registry, &cli.enable, &cli.disable, &cli.check)
    {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{}: {}", "error".red().bold(), err);
            return Ok(ERRNO_INVALIDARGS);
        }
    };

    let urls = match &cli.url {
        Some(spec) => match UrlMap::parse(spec) {
            Ok(urls) => urls,
            Err(err) => {
                eprintln!("{}: {}", "error".red().bold(), err);
                return Ok(ERRNO_INVALIDARGS);
            }
        },
        None => UrlMap::default(),
    };

    let global = match &cli.config {
        Some(path) => match LintConfig::load(path) {
            Ok(config) => Some(config),
            Err(err) => {
                eprintln!(
                    "{}: Failed to load config {}: {}",
                    "error".red().bold(),
                    path.display(),
                    err
                );
                return Ok(ERRNO_INVALIDARGS);
            }
        },
        None => LintConfig::load_global().unwrap_or_else(|err| {
            log::warn!("Ignoring user configuration: {}", err);
            None
        }),
    };

    let files = match expand_files(&cli.files) {
        Ok(files) => files,
        Err(err) => {
            eprintln!("{}: {}", "error".red().bold(), err);
            return Ok(ERRNO_INVALIDARGS);
        }
    };
    if let Some(missing) = files.iter().find(|file| !file.exists()) {
        eprintln!(
            "{}: {} does not exist",
            "error".red().bold(),
            missing.display()
        );
        return Ok(ERRNO_EXISTS);
    }

    let outputs = match open_outputs(requested_outputs(cli)) {
        Ok(outputs) => outputs,
        Err(err) => {
            eprintln!("{}: {}", "error".red().bold(), err);
            return Ok(ERRNO_EXISTS);
        }
    };

    let mut client = CliClient::new(Arc::new(options));
    if let Some(config) = &global {
        client = client.with_global(config);
    }

    let mut driver = LintDriver::new(registry, Box::new(client)).with_options(DriverOptions {
        full_path: cli.fullpath,
        show_lines: !cli.nolines,
    });
    if !cli.quiet {
        driver.add_listener(Box::new(ProgressListener { files: 0 }));
    }

    let result = driver.analyze(&files, None);
    log::info!(
        "Checked {} files in {:?}",
        result.files_checked,
        result.duration
    );

    if let Err(err) = write_reports(&result, outputs, &urls) {
        eprintln!("{}: Failed to write report: {}", "error".red().bold(), err);
        return Ok(ERRNO_EXISTS);
    }
    Ok(result.exit_code())
}

fn requested_outputs(cli: &Cli) -> Vec<Target> {
    let mut targets = Vec::new();
    if let Some(path) = &cli.html {
        if is_report_dir(path) {
            targets.push(Target::MultiHtml { dir: path.clone() });
        } else {
            targets.push(Target::Html {
                path: path.clone(),
                simple: false,
            });
        }
    }
    if let Some(path) = &cli.simplehtml {
        targets.push(Target::Html {
            path: path.clone(),
            simple: true,
        });
    }
    if let Some(path) = &cli.xml {
        targets.push(Target::Xml { path: path.clone() });
    }
    targets
}

/// Replaces stale report files and opens the new ones before the scan starts
fn open_outputs(targets: Vec<Target>) -> Result<Vec<Output>, ReportError> {
    let mut outputs = Vec::with_capacity(targets.len());
    for target in targets {
        let output = match target {
            Target::Html { path, simple } => {
                prepare_output(&path)?;
                let out = create_output(&path)?;
                Output::Html { path, simple, out }
            }
            Target::MultiHtml { dir } => Output::MultiHtml { dir },
            Target::Xml { path } => {
                prepare_output(&path)?;
                let out = create_output(&path)?;
                Output::Xml { path, out }
            }
        };
        outputs.push(output);
    }
    Ok(outputs)
}

/// Whether an `--html` target names a directory for per project reports
fn is_report_dir(path: &Path) -> bool {
    let text = path.to_string_lossy();
    path.is_dir() || text.ends_with(MAIN_SEPARATOR) || text.ends_with('/')
}

/// Expands glob patterns, keeping patterns that match nothing as literal paths
fn expand_files(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let matches: Vec<PathBuf> = glob(pattern)
            .with_context(|| format!("Invalid pattern '{}'", pattern))?
            .flatten()
            .collect();
        if matches.is_empty() {
            files.push(PathBuf::from(pattern));
        } else {
            files.extend(matches);
        }
    }
    Ok(files)
}

fn write_reports(
    result: &LintResult,
    outputs: Vec<Output>,
    urls: &UrlMap,
) -> Result<(), ReportError> {
    let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();
    let mut written = Vec::new();
    for output in outputs {
        match output {
            Output::Html { path, simple, out } => {
                reporters.push(Box::new(
                    HtmlReporter::new(out, &path)
                        .simple(simple)
                        .with_url_map(urls.clone())
                        .with_paths(result.paths.clone()),
                ));
                written.push(path);
            }
            Output::MultiHtml { dir } => {
                reporters.push(Box::new(
                    MultiProjectHtmlReporter::new(&dir)
                        .with_projects(result.projects().to_vec())
                        .with_url_map(urls.clone())
                        .with_paths(result.paths.clone()),
                ));
                written.push(dir.join("index.html"));
            }
            Output::Xml { path, out } => {
                reporters.push(Box::new(XmlReporter::new(out)));
                written.push(path);
            }
        }
    }
    if reporters.is_empty() {
        reporters.push(Box::new(
            TextReporter::stdout().with_paths(result.paths.clone()),
        ));
    }

    for reporter in &mut reporters {
        reporter.write(result.error_count, result.warning_count, &result.warnings)?;
    }
    for path in written {
        println!("Wrote report to {}", path.display());
    }
    Ok(())
}

fn list_issues(registry: &IssueRegistry, category: &str) {
    let stdout = io::stdout();
    let colored = stdout.is_terminal();
    let mut out = stdout.lock();
    for cat in registry.categories() {
        if !category.is_empty() && !cat.matches_prefix(category) {
            continue;
        }
        let heading = format!("\"{}\":", cat.full_name());
        let _ = writeln!(out, "{}", if colored { heading.bold().to_string() } else { heading });
        for issue in registry
            .issues()
            .iter()
            .filter(|issue| issue.category() == cat)
        {
            let _ = writeln!(out, "    \"{}\": {}", issue.id(), issue.summary());
        }
        let _ = writeln!(out);
    }
}

/// Prints the explanation of each requested issue; all issues when `ids` is empty
fn show_issues(registry: &IssueRegistry, ids: &[String]) -> i32 {
    let issues: Vec<&Arc<Issue>> = if ids.is_empty() {
        registry.issues().iter().collect()
    } else {
        let mut issues = Vec::new();
        for id in ids {
            match registry.issue(id) {
                Some(issue) => issues.push(issue),
                None => {
                    eprintln!("{}: Unknown issue id \"{}\"", "error".red().bold(), id);
                    return ERRNO_INVALIDARGS;
                }
            }
        }
        issues
    };

    for issue in issues {
        describe_issue(issue);
    }
    0
}

fn describe_issue(issue: &Issue) {
    println!("{}", issue.id().bold());
    println!("{}", "-".repeat(issue.id().len()));
    println!("Summary: {}", issue.summary());
    println!("Priority: {} / 10", issue.priority());
    println!("Severity: {}", issue.default_severity().description());
    println!("Category: {}", issue.category().full_name());
    if !issue.is_enabled_by_default() {
        println!("NOTE: This issue is disabled by default!");
        println!("You can enable it by adding --enable {}", issue.id());
    }
    println!();
    println!("{}", wrap(issue.explanation(), WRAP_WIDTH));
    if let Some(url) = issue.more_info() {
        println!("More information: {}", url);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &str = "<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\"\n    package=\"test.pkg\">\n    <uses-sdk android:minSdkVersion=\"8\" />\n</manifest>\n";

    const LAYOUT: &str = "<LinearLayout xmlns:android=\"http://schemas.android.com/apk/res/android\">\n    <Button android:text=\"OK\" />\n</LinearLayout>\n";

    fn sample_project(root: &Path) -> PathBuf {
        let dir = root.join("app");
        fs::create_dir_all(dir.join("res/layout")).unwrap();
        fs::write(dir.join("AndroidManifest.xml"), MANIFEST).unwrap();
        fs::write(dir.join("res/layout/main.xml"), LAYOUT).unwrap();
        dir
    }

    fn exit_code(args: &[&str]) -> i32 {
        let cli = Cli::try_parse_from(std::iter::once("droid-lint").chain(args.iter().copied()))
            .unwrap();
        run(&cli).unwrap()
    }

    #[test]
    fn test_exit_no_arguments_is_usage() {
        assert_eq!(exit_code(&[]), ERRNO_USAGE);
        assert_eq!(exit_code(&["--quiet"]), ERRNO_INVALIDARGS);
    }

    #[test]
    fn test_exit_missing_input() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");
        assert_eq!(
            exit_code(&["--quiet", missing.to_str().unwrap()]),
            ERRNO_EXISTS
        );
    }

    #[test]
    fn test_exit_invalid_arguments() {
        let temp = TempDir::new().unwrap();
        let dir = sample_project(temp.path());
        let dir = dir.to_str().unwrap();

        assert_eq!(
            exit_code(&["--quiet", "--check", "NoSuchIssue", dir]),
            ERRNO_INVALIDARGS
        );
        assert_eq!(
            exit_code(&["--quiet", "--url", "no-equals-sign", dir]),
            ERRNO_INVALIDARGS
        );
        assert_eq!(exit_code(&["--show", "NoSuchIssue"]), ERRNO_INVALIDARGS);
        assert_eq!(exit_code(&["--show", "HardcodedText"]), 0);
    }

    #[test]
    fn test_exit_unwritable_report_file() {
        let temp = TempDir::new().unwrap();
        let dir = sample_project(temp.path());
        let blocked = temp.path().join("report.xml");
        fs::create_dir(&blocked).unwrap();

        assert_eq!(
            exit_code(&[
                "--quiet",
                "--xml",
                blocked.to_str().unwrap(),
                dir.to_str().unwrap()
            ]),
            ERRNO_EXISTS
        );
    }

    #[test]
    fn test_exit_unwritable_project_page() {
        let temp = TempDir::new().unwrap();
        let dir = sample_project(temp.path());
        let reports = temp.path().join("reports");
        fs::create_dir_all(reports.join("app.html")).unwrap();

        let target = format!("{}/", reports.display());
        assert_eq!(
            exit_code(&["--quiet", "--html", target.as_str(), dir.to_str().unwrap()]),
            ERRNO_EXISTS
        );
    }

    #[test]
    fn test_exit_after_successful_report() {
        let temp = TempDir::new().unwrap();
        let dir = sample_project(temp.path());
        let report = temp.path().join("report.xml");
        fs::write(&report, "stale").unwrap();

        assert_eq!(
            exit_code(&[
                "--quiet",
                "--xml",
                report.to_str().unwrap(),
                dir.to_str().unwrap()
            ]),
            0
        );
        let xml = fs::read_to_string(&report).unwrap();
        assert!(xml.contains("HardcodedText"));
        assert!(!xml.contains("stale"));
    }

    #[test]
    fn test_flags_parse() {
        let cli = Cli::try_parse_from([
            "droid-lint",
            "--disable",
            "PxUsage,HardcodedText",
            "--ignore",
            "UselessLeaf",
            "--fullpaths",
            "--nolines",
            "app",
        ])
        .unwrap();
        assert_eq!(cli.disable, vec!["PxUsage", "HardcodedText", "UselessLeaf"]);
        assert!(cli.fullpath);
        assert!(cli.nolines);
        assert_eq!(cli.files, vec!["app"]);
    }

    #[test]
    fn test_list_without_category() {
        let cli = Cli::try_parse_from(["droid-lint", "--list"]).unwrap();
        assert_eq!(cli.list.as_deref(), Some(""));

        let cli = Cli::try_parse_from(["droid-lint", "--list", "Usability"]).unwrap();
        assert_eq!(cli.list.as_deref(), Some("Usability"));
    }

    #[test]
    fn test_help_kind() {
        let err = Cli::try_parse_from(["droid-lint", "--help"]).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_report_dir_detection() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(is_report_dir(temp.path()));
        assert!(is_report_dir(Path::new("reports/")));
        assert!(!is_report_dir(&temp.path().join("report.html")));
    }

    #[test]
    fn test_unmatched_pattern_kept_literally() {
        let files = expand_files(&["does/not/exist".to_string()]).unwrap();
        assert_eq!(files, vec![PathBuf::from("does/not/exist")]);
    }
}
