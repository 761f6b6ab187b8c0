use super::{get_or_try_init, ModelContext};
use crate::error::{Error, Result};
use crate::metadata::{AnnotationDescriptor, AnnotationValue};
use crate::runtime::RtAnnotation;
use std::cell::OnceCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

enum AnnotationOrigin {
    Source(Rc<AnnotationDescriptor>),
    Reflection(Rc<RtAnnotation>),
}

struct AnnotationInner {
    origin: AnnotationOrigin,
    parameters: OnceCell<Vec<AnnotationParameterModel>>,
}

/// An annotation applied to a class, member or parameter
#[derive(Clone)]
pub struct AnnotationInfoModel(Rc<AnnotationInner>);

/// One member value of an annotation
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationParameterModel {
    name: String,
    value: AnnotationValue,
}

impl AnnotationParameterModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &AnnotationValue {
        &self.value
    }
}

impl AnnotationInfoModel {
    pub(crate) fn of_source(ctx: &ModelContext, annotation: &Rc<AnnotationDescriptor>) -> Self {
        ctx.pool().get_or_create(annotation, (), |annotation, ()| {
            Self::new(AnnotationOrigin::Source(annotation.clone()))
        })
    }

    pub(crate) fn of_reflection(ctx: &ModelContext, annotation: &Rc<RtAnnotation>) -> Self {
        ctx.pool().get_or_create(annotation, (), |annotation, ()| {
            Self::new(AnnotationOrigin::Reflection(annotation.clone()))
        })
    }

    fn new(origin: AnnotationOrigin) -> Self {
        Self(Rc::new(AnnotationInner {
            origin,
            parameters: OnceCell::new(),
        }))
    }

    /// Binary name of the annotation type
    pub fn name(&self) -> &str {
        match &self.0.origin {
            AnnotationOrigin::Source(annotation) => &annotation.name,
            AnnotationOrigin::Reflection(annotation) => &annotation.name,
        }
    }

    /// Member values of the annotation.
    ///
    /// # Errors
    ///
    /// Reading members of a runtime annotation invokes their accessors; a failing
    /// accessor is reported as [`Error::ModelConstruction`].
    pub fn parameters(&self) -> Result<&[AnnotationParameterModel]> {
        let parameters = get_or_try_init(&self.0.parameters, || match &self.0.origin {
            AnnotationOrigin::Source(annotation) => Ok(annotation
                .values
                .iter()
                .map(|(name, value)| AnnotationParameterModel {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect()),
            AnnotationOrigin::Reflection(annotation) => annotation
                .members()
                .iter()
                .map(|member| {
                    member
                        .invoke()
                        .map(|value| AnnotationParameterModel {
                            name: member.name.clone(),
                            value,
                        })
                        .map_err(|message| Error::ModelConstruction {
                            annotation: annotation.name.clone(),
                            member: member.name.clone(),
                            message,
                        })
                })
                .collect(),
        })?;
        Ok(parameters.as_slice())
    }

    /// Value of one member, if present
    pub fn value(&self, member: &str) -> Result<Option<&AnnotationValue>> {
        Ok(self
            .parameters()?
            .iter()
            .find(|parameter| parameter.name == member)
            .map(|parameter| &parameter.value))
    }

    /// Value of one string member, if present and non-empty
    pub fn string_value(&self, member: &str) -> Result<Option<&str>> {
        Ok(self
            .value(member)?
            .and_then(AnnotationValue::as_str)
            .filter(|value| !value.is_empty()))
    }
}

impl PartialEq for AnnotationInfoModel {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for AnnotationInfoModel {}

impl Hash for AnnotationInfoModel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for AnnotationInfoModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name())
    }
}

/// Looks up an annotation by binary name
pub(crate) fn find<'a>(
    annotations: &'a [AnnotationInfoModel],
    name: &str,
) -> Option<&'a AnnotationInfoModel> {
    annotations.iter().find(|annotation| annotation.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::Classpath;
    use std::collections::BTreeMap;

    fn context() -> ModelContext {
        ModelContext::new(Rc::new(Classpath::with_jdk()))
    }

    #[test]
    fn test_source_annotation_values() {
        let ctx = context();
        let mut values = BTreeMap::new();
        values.insert(
            "value".to_string(),
            AnnotationValue::String("greeting".to_string()),
        );
        let descriptor = Rc::new(AnnotationDescriptor {
            name: "com.example.Endpoint".to_string(),
            values,
        });
        let annotation = AnnotationInfoModel::of_source(&ctx, &descriptor);

        assert_eq!(annotation.name(), "com.example.Endpoint");
        assert_eq!(annotation.string_value("value").unwrap(), Some("greeting"));
        assert_eq!(annotation.value("missing").unwrap(), None);
        assert_eq!(annotation, AnnotationInfoModel::of_source(&ctx, &descriptor));
    }

    #[test]
    fn test_empty_string_value_is_absent() {
        let ctx = context();
        let runtime = Rc::new(
            RtAnnotation::new("com.example.Endpoint")
                .with_value("value", AnnotationValue::String(String::new())),
        );
        let annotation = AnnotationInfoModel::of_reflection(&ctx, &runtime);
        assert_eq!(annotation.string_value("value").unwrap(), None);
    }

    #[test]
    fn test_failing_accessor_is_model_construction_error() {
        let ctx = context();
        let runtime = Rc::new(
            RtAnnotation::new("com.example.Endpoint")
                .with_accessor("value", || Err("accessor threw".to_string())),
        );
        let annotation = AnnotationInfoModel::of_reflection(&ctx, &runtime);

        match annotation.parameters() {
            Err(Error::ModelConstruction {
                annotation,
                member,
                message,
            }) => {
                assert_eq!(annotation, "com.example.Endpoint");
                assert_eq!(member, "value");
                assert_eq!(message, "accessor threw");
            }
            other => panic!("Unexpected result: {:?}", other.map(|p| p.len())),
        }
    }
}
