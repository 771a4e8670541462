//! Class-file model
//!
//! The engine never reads bytecode itself; the host parses class files (and
//! jar entries) into this representation via
//! [`LintClient::parse_class`](crate::client::LintClient::parse_class).
//! Names use JVM internal form (`com/example/Foo$Bar`).

/// An annotation as recorded in bytecode or handed over by the host.
#[derive(Debug, Clone, Default)]
pub struct AnnotationInfo {
    /// Type name in any of the common spellings: `SuppressLint`,
    /// `android.annotation.SuppressLint` or `Landroid/annotation/SuppressLint;`.
    pub name: String,
    /// String values of the annotation's elements, flattened.
    pub values: Vec<String>,
}

impl AnnotationInfo {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> AnnotationInfo {
        AnnotationInfo {
            name: name.into(),
            values,
        }
    }

    /// The bare type name, with package, descriptor syntax and enclosing
    /// types stripped.
    pub fn simple_name(&self) -> &str {
        let mut name = self.name.as_str();
        name = name.strip_prefix('L').unwrap_or(name);
        name = name.strip_suffix(';').unwrap_or(name);
        for sep in ['/', '.', '$'] {
            if let Some(idx) = name.rfind(sep) {
                name = &name[idx + 1..];
            }
        }
        name
    }
}

#[derive(Debug, Clone, Default)]
pub struct MethodInfo {
    pub name: String,
    /// JVM descriptor, e.g. `(Ljava/lang/String;)V`. Empty when unknown.
    pub descriptor: String,
    pub annotations: Vec<AnnotationInfo>,
    /// Internal names of classes this method instantiates. Used to connect
    /// anonymous classes back to the member that constructed them.
    pub new_instances: Vec<String>,
}

impl MethodInfo {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> MethodInfo {
        MethodInfo {
            name: name.into(),
            descriptor: descriptor.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldInfo {
    pub name: String,
    pub annotations: Vec<AnnotationInfo>,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>) -> FieldInfo {
        FieldInfo {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// One compiled class, as parsed by the host.
#[derive(Debug, Clone, Default)]
pub struct ClassInfo {
    /// Internal name, e.g. `com/example/Activity$1`.
    pub internal_name: String,
    pub super_name: Option<String>,
    /// Source file attribute, when the compiler recorded one.
    pub source_file: Option<String>,
    pub annotations: Vec<AnnotationInfo>,
    pub methods: Vec<MethodInfo>,
    pub fields: Vec<FieldInfo>,
    /// True for classes that came from jar libraries rather than the
    /// project's own output.
    pub from_library: bool,
}

impl ClassInfo {
    pub fn new(internal_name: impl Into<String>) -> ClassInfo {
        ClassInfo {
            internal_name: internal_name.into(),
            ..Default::default()
        }
    }

    /// Class name without the package.
    pub fn simple_name(&self) -> &str {
        self.internal_name
            .rsplit('/')
            .next()
            .unwrap_or(&self.internal_name)
    }

    /// Internal name of the directly enclosing class, going by `$` nesting.
    pub fn outer_internal_name(&self) -> Option<&str> {
        let idx = self.internal_name.rfind('$')?;
        Some(&self.internal_name[..idx])
    }

    /// True for compiler-named anonymous classes (`Foo$1`, `Foo$2$3`).
    pub fn is_anonymous(&self) -> bool {
        match self.simple_name().rsplit('$').next() {
            Some(last) => !last.is_empty() && last.bytes().all(|b| b.is_ascii_digit()),
            None => false,
        }
    }
}

/// A member of a class, for member-granular reporting.
#[derive(Debug, Clone, Copy)]
pub enum ClassMember<'a> {
    Method(&'a MethodInfo),
    Field(&'a FieldInfo),
}

impl<'a> ClassMember<'a> {
    pub fn annotations(&self) -> &'a [AnnotationInfo] {
        match self {
            ClassMember::Method(m) => &m.annotations,
            ClassMember::Field(f) => &f.annotations,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            ClassMember::Method(m) => &m.name,
            ClassMember::Field(f) => &f.name,
        }
    }
}

/// A reporting position inside the class model: a class, optionally narrowed
/// to one member, together with the stack of enclosing classes (nearest
/// first).
#[derive(Debug, Clone, Copy)]
pub struct ClassNode<'a> {
    pub class: &'a ClassInfo,
    pub member: Option<ClassMember<'a>>,
    pub outer: &'a [&'a ClassInfo],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_simple_name_forms() {
        for name in [
            "SuppressLint",
            "android.annotation.SuppressLint",
            "Landroid/annotation/SuppressLint;",
        ] {
            assert_eq!(AnnotationInfo::new(name, vec![]).simple_name(), "SuppressLint");
        }
    }

    #[test]
    fn anonymous_class_naming() {
        assert!(ClassInfo::new("com/example/Foo$1").is_anonymous());
        assert!(ClassInfo::new("com/example/Foo$2$13").is_anonymous());
        assert!(!ClassInfo::new("com/example/Foo$Bar").is_anonymous());
        assert!(!ClassInfo::new("com/example/Foo").is_anonymous());
        assert_eq!(
            ClassInfo::new("com/example/Foo$1").outer_internal_name(),
            Some("com/example/Foo")
        );
    }
}
