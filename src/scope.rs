//! Analysis scopes and resource folder types

use std::fmt;
use std::path::Path;

/// Name of the Android manifest file
pub const ANDROID_MANIFEST_XML: &str = "AndroidManifest.xml";
/// Name of the resource root folder inside a project
pub const RES_FOLDER: &str = "res";
/// Name of the ProGuard configuration file
pub const PROGUARD_CFG: &str = "proguard.cfg";

/// A kind of file (or group of files) a detector needs to look at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// The project manifest
    Manifest,
    /// A single resource file, analyzed on its own
    ResourceFile,
    /// All resource files of a project together
    AllResourceFiles,
    /// The ProGuard configuration file
    Proguard,
}

impl Scope {
    fn bit(self) -> u8 {
        match self {
            Scope::Manifest => 1,
            Scope::ResourceFile => 1 << 1,
            Scope::AllResourceFiles => 1 << 2,
            Scope::Proguard => 1 << 3,
        }
    }

    pub fn all() -> [Scope; 4] {
        [
            Scope::Manifest,
            Scope::ResourceFile,
            Scope::AllResourceFiles,
            Scope::Proguard,
        ]
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Manifest => write!(f, "manifest"),
            Scope::ResourceFile => write!(f, "resource-file"),
            Scope::AllResourceFiles => write!(f, "all-resource-files"),
            Scope::Proguard => write!(f, "proguard"),
        }
    }
}

/// A set of [`Scope`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScopeSet(u8);

impl ScopeSet {
    /// Everything in a project
    pub const ALL: ScopeSet = ScopeSet(0b1111);
    /// A single resource file
    pub const RESOURCE_FILE_SCOPE: ScopeSet = ScopeSet(0b0010);
    /// The manifest only
    pub const MANIFEST_SCOPE: ScopeSet = ScopeSet(0b0001);
    /// All resource files of a project
    pub const ALL_RESOURCES_SCOPE: ScopeSet = ScopeSet(0b0100);
    /// The ProGuard file only
    pub const PROGUARD_SCOPE: ScopeSet = ScopeSet(0b1000);

    pub const fn empty() -> Self {
        ScopeSet(0)
    }

    pub fn of(scopes: &[Scope]) -> Self {
        scopes
            .iter()
            .fold(ScopeSet::empty(), |set, scope| set.with(*scope))
    }

    pub fn with(self, scope: Scope) -> Self {
        ScopeSet(self.0 | scope.bit())
    }

    pub fn contains(&self, scope: Scope) -> bool {
        self.0 & scope.bit() != 0
    }

    pub fn union(self, other: ScopeSet) -> Self {
        ScopeSet(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Whether every scope in `self` is also in `other`
    pub fn is_subset(&self, other: ScopeSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Scope> + '_ {
        Scope::all().into_iter().filter(|s| self.contains(*s))
    }

    /// Infers the scope to analyze for an input path
    ///
    /// A directory means the whole project; the manifest, a resource file or
    /// the ProGuard file narrow the scope to that single kind of file.
    pub fn infer(path: &Path, is_dir: bool) -> ScopeSet {
        if is_dir {
            return ScopeSet::ALL;
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name == ANDROID_MANIFEST_XML {
            ScopeSet::MANIFEST_SCOPE
        } else if name == PROGUARD_CFG {
            ScopeSet::PROGUARD_SCOPE
        } else if has_extension(name, "xml") {
            ScopeSet::RESOURCE_FILE_SCOPE
        } else {
            ScopeSet::ALL
        }
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|s| s.to_string()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// Case-insensitive extension check on a file name
pub fn has_extension(name: &str, extension: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Type of an Android resource folder (`layout`, `values`, `drawable`...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFolderType {
    Anim,
    Animator,
    Color,
    Drawable,
    Interpolator,
    Layout,
    Menu,
    Mipmap,
    Raw,
    Values,
    Xml,
}

impl ResourceFolderType {
    /// Resolves a folder name such as `layout-land` or `values-fr`
    pub fn from_folder_name(folder: &str) -> Option<Self> {
        let base = folder.split('-').next().unwrap_or(folder);
        let kind = match base {
            "anim" => ResourceFolderType::Anim,
            "animator" => ResourceFolderType::Animator,
            "color" => ResourceFolderType::Color,
            "drawable" => ResourceFolderType::Drawable,
            "interpolator" => ResourceFolderType::Interpolator,
            "layout" => ResourceFolderType::Layout,
            "menu" => ResourceFolderType::Menu,
            "mipmap" => ResourceFolderType::Mipmap,
            "raw" => ResourceFolderType::Raw,
            "values" => ResourceFolderType::Values,
            "xml" => ResourceFolderType::Xml,
            _ => return None,
        };
        Some(kind)
    }

    /// Resource type name used in `@type/name` references
    pub fn resource_type(&self) -> &'static str {
        match self {
            ResourceFolderType::Anim => "anim",
            ResourceFolderType::Animator => "animator",
            ResourceFolderType::Color => "color",
            ResourceFolderType::Drawable => "drawable",
            ResourceFolderType::Interpolator => "interpolator",
            ResourceFolderType::Layout => "layout",
            ResourceFolderType::Menu => "menu",
            ResourceFolderType::Mipmap => "mipmap",
            ResourceFolderType::Raw => "raw",
            ResourceFolderType::Values => "values",
            ResourceFolderType::Xml => "xml",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_infer_resource_file() {
        let path = PathBuf::from("project/res/values/strings.xml");
        assert_eq!(
            ScopeSet::infer(&path, false),
            ScopeSet::RESOURCE_FILE_SCOPE
        );
        assert_ne!(ScopeSet::infer(&path, false), ScopeSet::ALL);
    }

    #[test]
    fn test_infer_manifest() {
        let path = PathBuf::from("project/AndroidManifest.xml");
        let scope = ScopeSet::infer(&path, false);
        assert_eq!(scope, ScopeSet::MANIFEST_SCOPE);
        assert_eq!(scope.iter().collect::<Vec<_>>(), vec![Scope::Manifest]);
    }

    #[test]
    fn test_infer_directory_and_proguard() {
        assert_eq!(ScopeSet::infer(Path::new("project"), true), ScopeSet::ALL);
        assert_eq!(
            ScopeSet::infer(Path::new("project/proguard.cfg"), false),
            ScopeSet::PROGUARD_SCOPE
        );
    }

    #[test]
    fn test_subset() {
        let unused = ScopeSet::of(&[Scope::AllResourceFiles, Scope::Manifest]);
        assert!(!unused.is_subset(ScopeSet::RESOURCE_FILE_SCOPE));
        assert!(unused.is_subset(ScopeSet::ALL));
        assert!(ScopeSet::RESOURCE_FILE_SCOPE.is_subset(ScopeSet::RESOURCE_FILE_SCOPE));
        assert!(ScopeSet::empty().is_subset(ScopeSet::MANIFEST_SCOPE));
    }

    #[test]
    fn test_folder_types() {
        assert_eq!(
            ResourceFolderType::from_folder_name("layout-land"),
            Some(ResourceFolderType::Layout)
        );
        assert_eq!(
            ResourceFolderType::from_folder_name("values"),
            Some(ResourceFolderType::Values)
        );
        assert_eq!(ResourceFolderType::from_folder_name("assets"), None);
    }
}
