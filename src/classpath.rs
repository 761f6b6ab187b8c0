use crate::error::{Error, Result};
use crate::parser::ScannedClass;
use crate::runtime::{RtClass, Runtime};
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

/// Package prefixes of the standard library and the runtime itself
const JDK_PREFIXES: &[&str] = &["java.", "javax.", "jdk.", "sun.", "com.sun."];

/// Returns whether `name` belongs to the standard library or the runtime
pub fn is_jdk_class(name: &str) -> bool {
    JDK_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// A class found on the classpath, from either backend
#[derive(Debug, Clone)]
pub enum ClassHandle {
    Scanned(Rc<ScannedClass>),
    Runtime(Rc<RtClass>),
}

/// All classes visible to one engine run.
///
/// Scanned descriptors shadow runtime classes of the same name, the way classes
/// found by a byte-code scan take precedence over what the running program has
/// loaded.
#[derive(Debug, Default)]
pub struct Classpath {
    scanned: HashMap<String, Rc<ScannedClass>>,
    runtime: Runtime,
}

impl Classpath {
    pub fn new(runtime: Runtime) -> Self {
        Self {
            scanned: HashMap::new(),
            runtime,
        }
    }

    /// A classpath backed by the standard-library catalog only
    pub fn with_jdk() -> Self {
        Self::new(Runtime::with_jdk())
    }

    /// Adds a scanned class, replacing one with the same name
    pub fn add(&mut self, class: ScannedClass) {
        let name = class.name().to_string();
        debug!("Adding scanned class {} from {}", name, class.source.display());
        if self.scanned.insert(name.clone(), Rc::new(class)).is_some() {
            warn!("Class {} found twice on the classpath, keeping the latest", name);
        }
    }

    pub fn extend(&mut self, classes: impl IntoIterator<Item = ScannedClass>) {
        for class in classes {
            self.add(class);
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    /// Finds a class by binary name
    pub fn find(&self, name: &str) -> Option<ClassHandle> {
        if let Some(class) = self.scanned.get(name) {
            return Some(ClassHandle::Scanned(class.clone()));
        }
        self.runtime
            .class_for_name(name)
            .map(ClassHandle::Runtime)
    }

    /// Finds a class by binary name, failing with a resolution error
    pub fn lookup(&self, name: &str) -> Result<ClassHandle> {
        self.find(name)
            .ok_or_else(|| Error::Resolution(name.to_string()))
    }

    /// Names of all non-standard-library classes from both backends, sorted
    pub fn user_class_names(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .scanned
            .keys()
            .map(String::as_str)
            .chain(self.runtime.class_names())
            .filter(|name| !is_jdk_class(name))
            .collect();
        names.into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DescriptorParser;
    use std::path::Path;

    fn scanned(yaml: &str) -> ScannedClass {
        DescriptorParser::parse_str(yaml, Path::new("test.yaml"))
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_jdk_prefixes() {
        assert!(is_jdk_class("java.lang.String"));
        assert!(is_jdk_class("javax.annotation.Nonnull"));
        assert!(!is_jdk_class("com.example.Item"));
        assert!(!is_jdk_class("javalike.Thing"));
    }

    #[test]
    fn test_scanned_shadows_runtime() {
        let mut runtime = Runtime::new();
        runtime.register(RtClass::new("com.example.Item"));
        let mut classpath = Classpath::new(runtime);
        classpath.add(scanned("name: com.example.Item\n"));

        assert!(matches!(
            classpath.find("com.example.Item"),
            Some(ClassHandle::Scanned(_))
        ));
    }

    #[test]
    fn test_lookup_missing_class_is_resolution_error() {
        let classpath = Classpath::with_jdk();
        let err = classpath.lookup("com.example.Missing").unwrap_err();
        assert!(matches!(err, Error::Resolution(name) if name == "com.example.Missing"));
        assert!(classpath.lookup("java.util.List").is_ok());
    }

    #[test]
    fn test_user_class_names_excludes_jdk() {
        let mut classpath = Classpath::with_jdk();
        classpath.add(scanned("name: com.example.B\n"));
        classpath
            .runtime_mut()
            .register(RtClass::new("com.example.A"));

        assert_eq!(
            classpath.user_class_names(),
            vec!["com.example.A".to_string(), "com.example.B".to_string()]
        );
    }
}
