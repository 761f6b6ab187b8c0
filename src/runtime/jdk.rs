//! Standard-library catalog.
//!
//! Only declarations matter here: names, kinds, generic parameters and the
//! supertype graph. That is enough to answer "is this a collection?", "what is
//! the element type of this list subclass?" and similar questions for classes
//! that are never scanned.

use super::{RtClass, RtType, RtTypeParameter, Runtime};
use crate::metadata::Modifier;

fn var(name: &str) -> RtType {
    RtType::variable(name)
}

fn param(name: &str) -> RtTypeParameter {
    RtTypeParameter::new(name, vec![RtType::class("java.lang.Object")])
}

fn generic(raw: &str, args: &[&str]) -> RtType {
    RtType::parameterized(raw, args.iter().map(|arg| var(arg)).collect())
}

fn final_value_class(name: &str, superclass: &str, interfaces: &[&str]) -> RtClass {
    let mut class = RtClass::new(name).extends(RtType::class(superclass));
    for interface in interfaces {
        class = class.implements(RtType::class(*interface));
    }
    class
}

/// Registers the catalog into `runtime`
pub fn register(runtime: &mut Runtime) {
    let comparable_self =
        |name: &str| RtType::parameterized("java.lang.Comparable", vec![RtType::class(name)]);

    runtime.register(RtClass::new("java.lang.Object"));
    runtime.register(RtClass::interface("java.io.Serializable"));
    runtime.register(RtClass::interface("java.lang.CharSequence"));
    runtime.register(RtClass::interface("java.lang.Comparable").type_parameter(param("T")));
    runtime.register(
        RtClass::new("java.lang.String")
            .implements(RtType::class("java.io.Serializable"))
            .implements(RtType::class("java.lang.CharSequence"))
            .implements(comparable_self("java.lang.String")),
    );
    runtime.register(final_value_class(
        "java.lang.Boolean",
        "java.lang.Object",
        &["java.io.Serializable"],
    ));
    runtime.register(final_value_class(
        "java.lang.Character",
        "java.lang.Object",
        &["java.io.Serializable"],
    ));
    runtime.register(RtClass::new("java.lang.Void"));

    runtime.register(
        RtClass::new("java.lang.Number")
            .with_modifiers(vec![Modifier::Public, Modifier::Abstract])
            .implements(RtType::class("java.io.Serializable")),
    );
    for name in [
        "java.lang.Byte",
        "java.lang.Short",
        "java.lang.Integer",
        "java.lang.Long",
        "java.lang.Float",
        "java.lang.Double",
        "java.math.BigInteger",
        "java.math.BigDecimal",
    ] {
        runtime.register(
            RtClass::new(name)
                .extends(RtType::class("java.lang.Number"))
                .implements(comparable_self(name)),
        );
    }

    runtime.register(
        RtClass::new("java.lang.Enum")
            .type_parameter(RtTypeParameter::new(
                "E",
                vec![generic("java.lang.Enum", &["E"])],
            ))
            .implements(generic("java.lang.Comparable", &["E"]))
            .implements(RtType::class("java.io.Serializable")),
    );
    runtime.register(RtClass::new("java.lang.Record"));

    // collections
    runtime.register(RtClass::interface("java.lang.Iterable").type_parameter(param("T")));
    runtime.register(
        RtClass::interface("java.util.Collection")
            .type_parameter(param("E"))
            .implements(generic("java.lang.Iterable", &["E"])),
    );
    for name in ["java.util.List", "java.util.Set", "java.util.Queue"] {
        runtime.register(
            RtClass::interface(name)
                .type_parameter(param("E"))
                .implements(generic("java.util.Collection", &["E"])),
        );
    }
    for (name, interface) in [
        ("java.util.ArrayList", "java.util.List"),
        ("java.util.LinkedList", "java.util.List"),
        ("java.util.HashSet", "java.util.Set"),
        ("java.util.TreeSet", "java.util.Set"),
    ] {
        runtime.register(
            RtClass::new(name)
                .type_parameter(param("E"))
                .implements(generic(interface, &["E"]))
                .implements(RtType::class("java.io.Serializable")),
        );
    }
    runtime.register(
        RtClass::new("java.util.LinkedHashSet")
            .type_parameter(param("E"))
            .extends(generic("java.util.HashSet", &["E"])),
    );

    runtime.register(
        RtClass::interface("java.util.Map")
            .type_parameter(param("K"))
            .type_parameter(param("V")),
    );
    for name in ["java.util.HashMap", "java.util.TreeMap"] {
        runtime.register(
            RtClass::new(name)
                .type_parameter(param("K"))
                .type_parameter(param("V"))
                .implements(generic("java.util.Map", &["K", "V"])),
        );
    }
    runtime.register(
        RtClass::new("java.util.LinkedHashMap")
            .type_parameter(param("K"))
            .type_parameter(param("V"))
            .extends(generic("java.util.HashMap", &["K", "V"])),
    );

    runtime.register(RtClass::new("java.util.Optional").type_parameter(param("T")));
    runtime.register(RtClass::interface("java.util.stream.Stream").type_parameter(param("T")));

    // identifiers
    runtime.register(final_value_class(
        "java.util.UUID",
        "java.lang.Object",
        &["java.io.Serializable"],
    ));
    runtime.register(RtClass::new("java.net.URI"));
    runtime.register(RtClass::new("java.net.URL"));

    // dates and times
    runtime.register(RtClass::interface("java.time.temporal.Temporal"));
    runtime.register(
        RtClass::new("java.util.Date").implements(RtType::class("java.io.Serializable")),
    );
    for name in [
        "java.time.LocalDate",
        "java.time.LocalDateTime",
        "java.time.LocalTime",
        "java.time.Instant",
        "java.time.ZonedDateTime",
        "java.time.OffsetDateTime",
    ] {
        runtime.register(
            RtClass::new(name)
                .implements(RtType::class("java.time.temporal.Temporal"))
                .implements(RtType::class("java.io.Serializable")),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ClassKind;

    #[test]
    fn test_catalog_contains_collection_hierarchy() {
        let runtime = Runtime::with_jdk();
        let array_list = runtime.class_for_name("java.util.ArrayList").unwrap();
        assert_eq!(array_list.type_parameters[0].name, "E");
        assert_eq!(
            array_list.interfaces[0],
            RtType::parameterized("java.util.List", vec![RtType::variable("E")])
        );

        let list = runtime.class_for_name("java.util.List").unwrap();
        assert_eq!(list.kind, ClassKind::Interface);
        assert!(list.superclass.is_none());
    }

    #[test]
    fn test_catalog_contains_boxed_numbers() {
        let runtime = Runtime::with_jdk();
        let integer = runtime.class_for_name("java.lang.Integer").unwrap();
        assert_eq!(integer.superclass, Some(RtType::class("java.lang.Number")));
    }

    #[test]
    fn test_object_has_no_superclass() {
        let runtime = Runtime::with_jdk();
        let object = runtime.class_for_name("java.lang.Object").unwrap();
        assert!(object.superclass.is_none());
    }
}
