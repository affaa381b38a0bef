//! Android projects and how input paths map onto them

use crate::scope::{has_extension, ScopeSet, ANDROID_MANIFEST_XML, PROGUARD_CFG, RES_FOLDER};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A project directory, optionally restricted to a subset of its files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    dir: PathBuf,
    name: String,
    subset: Option<Vec<PathBuf>>,
}

impl Project {
    pub fn new(dir: PathBuf) -> Self {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        Self {
            dir,
            name,
            subset: None,
        }
    }

    /// Whether `dir` holds an Android project
    pub fn is_project_dir(dir: &Path) -> bool {
        dir.join(ANDROID_MANIFEST_XML).is_file()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The explicitly requested files, `None` when the whole project is checked
    pub fn subset(&self) -> Option<&[PathBuf]> {
        self.subset.as_deref()
    }

    pub fn manifest_file(&self) -> PathBuf {
        self.dir.join(ANDROID_MANIFEST_XML)
    }

    pub fn resource_dir(&self) -> PathBuf {
        self.dir.join(RES_FOLDER)
    }

    pub fn proguard_file(&self) -> PathBuf {
        self.dir.join(PROGUARD_CFG)
    }

    /// Whether `file` should be checked in this run
    pub fn includes(&self, file: &Path) -> bool {
        match &self.subset {
            Some(files) => files.iter().any(|f| f == file),
            None => true,
        }
    }

    /// The scope implied by what was asked for
    pub fn infer_scope(&self) -> ScopeSet {
        match &self.subset {
            None => ScopeSet::ALL,
            Some(files) => files
                .iter()
                .fold(ScopeSet::empty(), |scope, file| {
                    scope.union(ScopeSet::infer(file, false))
                }),
        }
    }

    fn add_file(&mut self, file: PathBuf) {
        if let Some(files) = &mut self.subset {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }

    fn check_everything(&mut self) {
        self.subset = None;
    }
}

/// Maps input paths to the projects that contain them
///
/// - a project directory is checked as a whole
/// - a file is checked on its own, within the nearest enclosing project
/// - a directory inside a project checks the files below it
/// - any other directory is searched for projects
pub fn compute_projects(inputs: &[PathBuf]) -> Vec<Project> {
    let mut projects: Vec<Project> = Vec::new();

    for input in inputs {
        if input.is_dir() {
            if Project::is_project_dir(input) {
                project_entry(&mut projects, input, None).check_everything();
            } else if let Some(dir) = enclosing_project(input) {
                let files: Vec<PathBuf> = WalkDir::new(input)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(Result::ok)
                    .filter(|entry| entry.file_type().is_file())
                    .map(|entry| entry.into_path())
                    .collect();
                let project = project_entry(&mut projects, &dir, Some(Vec::new()));
                for file in files {
                    project.add_file(file);
                }
            } else {
                let found: Vec<PathBuf> = WalkDir::new(input)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(Result::ok)
                    .filter(|entry| entry.file_type().is_dir())
                    .map(|entry| entry.into_path())
                    .filter(|dir| Project::is_project_dir(dir))
                    .collect();
                if found.is_empty() {
                    log::warn!("No Android projects found in {}", input.display());
                }
                for dir in found {
                    project_entry(&mut projects, &dir, None).check_everything();
                }
            }
        } else if input.is_file() {
            match enclosing_project(input) {
                Some(dir) => {
                    project_entry(&mut projects, &dir, Some(Vec::new())).add_file(input.clone())
                }
                None => log::warn!("No project found for {}", input.display()),
            }
        } else {
            log::warn!("{} does not exist", input.display());
        }
    }

    projects
}

fn project_entry<'p>(
    projects: &'p mut Vec<Project>,
    dir: &Path,
    subset: Option<Vec<PathBuf>>,
) -> &'p mut Project {
    let index = match projects.iter().position(|p| p.dir == dir) {
        Some(index) => index,
        None => {
            let mut project = Project::new(dir.to_path_buf());
            project.subset = subset;
            projects.push(project);
            projects.len() - 1
        }
    };
    &mut projects[index]
}

/// Finds the project a path lives in
///
/// Prefers the nearest ancestor holding a manifest; resource files of a
/// project without a manifest fall back to the directory containing `res`.
fn enclosing_project(path: &Path) -> Option<PathBuf> {
    if let Some(dir) = path.ancestors().skip(1).find(|dir| Project::is_project_dir(dir)) {
        return Some(dir.to_path_buf());
    }
    path.ancestors()
        .skip(1)
        .find(|dir| dir.file_name().is_some_and(|name| name == RES_FOLDER))
        .and_then(Path::parent)
        .map(Path::to_path_buf)
}

/// Whether `file` is an XML file directly inside a resource folder
pub fn is_resource_file(file: &Path) -> bool {
    let in_res = file
        .parent()
        .and_then(Path::parent)
        .and_then(Path::file_name)
        .is_some_and(|name| name == RES_FOLDER);
    let name = file.file_name().and_then(|n| n.to_str()).unwrap_or("");
    in_res && has_extension(name, "xml")
}
