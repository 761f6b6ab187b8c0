//! Type classification shared by the collector, the plugins and the schema
//! generator.
//!
//! Signatures are normalized when they are built from either backend, so each
//! predicate is written once and answers the same way for both. Those
//! that need the class hierarchy (maps, iterables, enums) look classes up through
//! the context and walk their supertypes.

use super::{ModelContext, SignatureModel};
use crate::classpath::is_jdk_class;
use crate::signature::BaseType;

pub const OBJECT: &str = "java.lang.Object";
pub const STRING: &str = "java.lang.String";
pub const CHARACTER: &str = "java.lang.Character";
pub const CHAR_SEQUENCE: &str = "java.lang.CharSequence";
pub const BOOLEAN: &str = "java.lang.Boolean";
pub const BYTE: &str = "java.lang.Byte";
pub const SHORT: &str = "java.lang.Short";
pub const INTEGER: &str = "java.lang.Integer";
pub const LONG: &str = "java.lang.Long";
pub const BIG_INTEGER: &str = "java.math.BigInteger";
pub const FLOAT: &str = "java.lang.Float";
pub const DOUBLE: &str = "java.lang.Double";
pub const BIG_DECIMAL: &str = "java.math.BigDecimal";
pub const ITERABLE: &str = "java.lang.Iterable";
pub const MAP: &str = "java.util.Map";
pub const OPTIONAL: &str = "java.util.Optional";

pub const LOCAL_DATE: &str = "java.time.LocalDate";
pub const DATE_TIMES: &[&str] = &[
    "java.time.LocalDateTime",
    "java.time.Instant",
    "java.time.ZonedDateTime",
    "java.time.OffsetDateTime",
    "java.util.Date",
];

pub const JSON_VALUE: &str = "com.fasterxml.jackson.annotation.JsonValue";
pub const JSON_IGNORE: &str = "com.fasterxml.jackson.annotation.JsonIgnore";
pub const JSON_PROPERTY: &str = "com.fasterxml.jackson.annotation.JsonProperty";

impl SignatureModel {
    fn class_name(&self) -> Option<&str> {
        self.as_class_ref().map(|class_ref| class_ref.name())
    }

    fn base_type(&self) -> Option<BaseType> {
        match self {
            SignatureModel::Base(base) => Some(base.base_type()),
            _ => None,
        }
    }

    /// A primitive type other than `void`
    pub fn is_primitive(&self) -> bool {
        matches!(self.base_type(), Some(base) if base != BaseType::Void)
    }

    pub fn is_void(&self) -> bool {
        self.base_type() == Some(BaseType::Void)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, SignatureModel::Array(_))
    }

    pub fn is_string(&self) -> bool {
        self.base_type() == Some(BaseType::Char)
            || matches!(self.class_name(), Some(STRING | CHARACTER | CHAR_SEQUENCE))
    }

    pub fn is_boolean(&self) -> bool {
        self.base_type() == Some(BaseType::Boolean) || self.class_name() == Some(BOOLEAN)
    }

    pub fn has_integer_type(&self) -> bool {
        matches!(
            self.base_type(),
            Some(BaseType::Byte | BaseType::Short | BaseType::Int | BaseType::Long)
        ) || matches!(
            self.class_name(),
            Some(BYTE | SHORT | INTEGER | LONG | BIG_INTEGER)
        )
    }

    pub fn has_float_type(&self) -> bool {
        matches!(self.base_type(), Some(BaseType::Float | BaseType::Double))
            || matches!(self.class_name(), Some(FLOAT | DOUBLE | BIG_DECIMAL))
    }

    pub fn is_optional(&self) -> bool {
        self.class_name() == Some(OPTIONAL)
    }

    pub fn is_date(&self) -> bool {
        self.class_name() == Some(LOCAL_DATE)
    }

    pub fn is_date_time(&self) -> bool {
        matches!(self.class_name(), Some(name) if DATE_TIMES.contains(&name))
    }

    /// A reference to a standard-library class
    pub fn is_jdk(&self) -> bool {
        matches!(self.class_name(), Some(name) if is_jdk_class(name))
    }

    pub fn is_map(&self, ctx: &ModelContext) -> bool {
        self.is_assignable_to(ctx, MAP)
    }

    /// An array or a reference to a class implementing `Iterable`
    pub fn is_iterable(&self, ctx: &ModelContext) -> bool {
        self.is_array() || self.is_assignable_to(ctx, ITERABLE)
    }

    pub fn is_enum(&self, ctx: &ModelContext) -> bool {
        self.class_name()
            .and_then(|name| ctx.find_class(name))
            .is_some_and(|class| class.is_enum())
    }

    fn is_assignable_to(&self, ctx: &ModelContext, target: &str) -> bool {
        match self.class_name() {
            Some(name) if name == target => true,
            Some(name) => ctx
                .find_class(name)
                .is_some_and(|class| class.is_assignable_to(ctx, target)),
            None => false,
        }
    }
}
