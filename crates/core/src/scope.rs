//! File-category scopes: which parts of a project a detector wants to see

use std::fmt;

/// A category of project input that a detector can register interest in.
///
/// Single-file scopes (`ResourceFile`, `JavaFile`, `ClassFile`) promise the
/// detector works one file at a time and can run incrementally. The `All*`
/// variants demand a whole-project pass and disqualify the detector from
/// single-file runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Scope {
    /// One resource XML file at a time (`res/layout/main.xml`, ...).
    ResourceFile,
    /// Binary resource contents (bitmaps, raw assets).
    BinaryResourceFile,
    /// Names of resource folders, without opening the files inside.
    ResourceFolder,
    /// Every resource file in the project, as one pass.
    AllResourceFiles,
    /// One Java or Kotlin source file at a time.
    JavaFile,
    /// Every Java/Kotlin source file in the project, as one pass.
    AllJavaFiles,
    /// One compiled class at a time.
    ClassFile,
    /// Every compiled class in the project, as one pass.
    AllClassFiles,
    /// The project manifest.
    Manifest,
    /// Shrinker configuration files.
    ProguardFile,
    /// Build scripts.
    GradleFile,
    /// Java `.properties` files in the project root.
    PropertyFile,
    /// Classes in bundled jar libraries.
    JavaLibraries,
    /// Sources under test roots.
    TestSources,
    /// Files not covered by any other category.
    Other,
}

/// All scopes, in declaration order. Iteration over a [`ScopeSet`] follows
/// this order.
pub const ALL_SCOPES: [Scope; 15] = [
    Scope::ResourceFile,
    Scope::BinaryResourceFile,
    Scope::ResourceFolder,
    Scope::AllResourceFiles,
    Scope::JavaFile,
    Scope::AllJavaFiles,
    Scope::ClassFile,
    Scope::AllClassFiles,
    Scope::Manifest,
    Scope::ProguardFile,
    Scope::GradleFile,
    Scope::PropertyFile,
    Scope::JavaLibraries,
    Scope::TestSources,
    Scope::Other,
];

impl Scope {
    fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// A set of [`Scope`] values, packed into a bitmask.
///
/// Scope sets are tiny and copied freely; all set operations are O(1).
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ScopeSet(u16);

impl ScopeSet {
    /// The empty set.
    pub const fn empty() -> Self {
        ScopeSet(0)
    }

    /// Every scope. This is the default for whole-project analysis.
    pub fn all() -> Self {
        ALL_SCOPES.iter().copied().collect()
    }

    /// A set holding a single scope.
    pub fn of(scope: Scope) -> Self {
        ScopeSet(scope.bit())
    }

    /// Build a set from a slice of scopes.
    pub fn from_scopes(scopes: &[Scope]) -> Self {
        scopes.iter().copied().collect()
    }

    pub fn contains(&self, scope: Scope) -> bool {
        self.0 & scope.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn insert(&mut self, scope: Scope) {
        self.0 |= scope.bit();
    }

    pub fn remove(&mut self, scope: Scope) {
        self.0 &= !scope.bit();
    }

    pub fn union(&self, other: ScopeSet) -> ScopeSet {
        ScopeSet(self.0 | other.0)
    }

    pub fn intersection(&self, other: ScopeSet) -> ScopeSet {
        ScopeSet(self.0 & other.0)
    }

    /// True when every scope in `self` is also in `other`.
    pub fn is_subset_of(&self, other: ScopeSet) -> bool {
        self.0 & !other.0 == 0
    }

    /// True when `self` and `other` share at least one scope.
    pub fn intersects(&self, other: ScopeSet) -> bool {
        self.0 & other.0 != 0
    }

    /// Iterate the member scopes in [`ALL_SCOPES`] order.
    pub fn iter(&self) -> impl Iterator<Item = Scope> + '_ {
        ALL_SCOPES.iter().copied().filter(|s| self.contains(*s))
    }
}

impl FromIterator<Scope> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = Scope>>(iter: I) -> Self {
        let mut set = ScopeSet::empty();
        for scope in iter {
            set.insert(scope);
        }
        set
    }
}

impl From<Scope> for ScopeSet {
    fn from(scope: Scope) -> Self {
        ScopeSet::of(scope)
    }
}

impl fmt::Debug for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// The kind of an Android resource folder, derived from the folder name with
/// any configuration qualifiers stripped (`values-en-rUS` → `Values`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFolderKind {
    Anim,
    Animator,
    Color,
    Drawable,
    Font,
    Interpolator,
    Layout,
    Menu,
    Mipmap,
    Navigation,
    Raw,
    Transition,
    Values,
    Xml,
}

impl ResourceFolderKind {
    /// Classify a resource folder by name. Returns `None` for folders that are
    /// not part of the resource taxonomy; those are skipped during traversal.
    pub fn from_folder_name(name: &str) -> Option<ResourceFolderKind> {
        let base = name.split('-').next().unwrap_or(name);
        match base {
            "anim" => Some(ResourceFolderKind::Anim),
            "animator" => Some(ResourceFolderKind::Animator),
            "color" => Some(ResourceFolderKind::Color),
            "drawable" => Some(ResourceFolderKind::Drawable),
            "font" => Some(ResourceFolderKind::Font),
            "interpolator" => Some(ResourceFolderKind::Interpolator),
            "layout" => Some(ResourceFolderKind::Layout),
            "menu" => Some(ResourceFolderKind::Menu),
            "mipmap" => Some(ResourceFolderKind::Mipmap),
            "navigation" => Some(ResourceFolderKind::Navigation),
            "raw" => Some(ResourceFolderKind::Raw),
            "transition" => Some(ResourceFolderKind::Transition),
            "values" => Some(ResourceFolderKind::Values),
            "xml" => Some(ResourceFolderKind::Xml),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmask_round_trip() {
        let mut set = ScopeSet::empty();
        assert!(set.is_empty());
        set.insert(Scope::JavaFile);
        set.insert(Scope::Manifest);
        assert!(set.contains(Scope::JavaFile));
        assert!(!set.contains(Scope::ResourceFile));
        assert_eq!(set.len(), 2);
        set.remove(Scope::JavaFile);
        assert!(!set.contains(Scope::JavaFile));
    }

    #[test]
    fn set_algebra() {
        let a = ScopeSet::from_scopes(&[Scope::JavaFile, Scope::ClassFile]);
        let b = ScopeSet::from_scopes(&[Scope::ClassFile, Scope::Manifest]);
        assert_eq!(a.intersection(b), ScopeSet::of(Scope::ClassFile));
        assert_eq!(a.union(b).len(), 3);
        assert!(ScopeSet::of(Scope::ClassFile).is_subset_of(a));
        assert!(!a.is_subset_of(b));
        assert!(a.intersects(b));
    }

    #[test]
    fn all_covers_every_scope() {
        let all = ScopeSet::all();
        for scope in ALL_SCOPES {
            assert!(all.contains(scope));
        }
        assert_eq!(all.len(), ALL_SCOPES.len());
    }

    #[test]
    fn iteration_follows_declaration_order() {
        let set = ScopeSet::from_scopes(&[Scope::Other, Scope::Manifest, Scope::JavaFile]);
        let order: Vec<Scope> = set.iter().collect();
        assert_eq!(order, vec![Scope::JavaFile, Scope::Manifest, Scope::Other]);
    }

    #[test]
    fn folder_kind_strips_qualifiers() {
        assert_eq!(
            ResourceFolderKind::from_folder_name("values-en-rUS"),
            Some(ResourceFolderKind::Values)
        );
        assert_eq!(
            ResourceFolderKind::from_folder_name("layout-land"),
            Some(ResourceFolderKind::Layout)
        );
        assert_eq!(ResourceFolderKind::from_folder_name("scratch"), None);
    }
}
