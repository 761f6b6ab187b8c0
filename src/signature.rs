//! JVM type signature grammar.
//!
//! Class descriptors carry member types the way compiled classes do: as field
//! descriptors (`Ljava/lang/String;`), method descriptors (`(I)V`) and, for generic
//! declarations, the richer `Signature` attribute syntax
//! (`Ljava/util/List<+Lcom/example/Item;>;`, `<T:Ljava/lang/Object;>...`).
//! Plain descriptors are a subset of the signature grammar, so one reader handles
//! both.

use crate::error::{Error, Result};

/// Primitive (base) types plus `void` for method results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl BaseType {
    /// Maps a descriptor character to a base type
    pub fn from_descriptor(c: u8) -> Option<Self> {
        match c {
            b'Z' => Some(BaseType::Boolean),
            b'B' => Some(BaseType::Byte),
            b'C' => Some(BaseType::Char),
            b'S' => Some(BaseType::Short),
            b'I' => Some(BaseType::Int),
            b'J' => Some(BaseType::Long),
            b'F' => Some(BaseType::Float),
            b'D' => Some(BaseType::Double),
            b'V' => Some(BaseType::Void),
            _ => None,
        }
    }

    /// The Java keyword for this type
    pub fn java_name(self) -> &'static str {
        match self {
            BaseType::Boolean => "boolean",
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Short => "short",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Float => "float",
            BaseType::Double => "double",
            BaseType::Void => "void",
        }
    }
}

/// A parsed Java type signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSig {
    Base(BaseType),
    Array(Box<TypeSig>),
    Class(ClassTypeSig),
    /// Usage of a type variable, e.g. `TT;`
    Variable(String),
}

/// A class type signature, possibly an inner class of a generic owner.
///
/// `name` is always the binary name (`com.example.Outer$Inner`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassTypeSig {
    pub name: String,
    pub type_args: Vec<TypeArg>,
    pub owner: Option<Box<ClassTypeSig>>,
}

impl ClassTypeSig {
    /// A raw (non-parameterized) reference to a class given by binary name
    pub fn raw(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_args: Vec::new(),
            owner: None,
        }
    }
}

/// Wildcard indicator of a type argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wildcard {
    /// A concrete argument, no wildcard
    None,
    /// `?`
    Any,
    /// `? extends T`
    Extends,
    /// `? super T`
    Super,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeArg {
    pub wildcard: Wildcard,
    pub bound: Option<TypeSig>,
}

/// A formal type parameter declaration, e.g. `T:Ljava/lang/Number;`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParamSig {
    pub name: String,
    pub class_bound: Option<TypeSig>,
    pub interface_bounds: Vec<TypeSig>,
}

impl TypeParamSig {
    /// Class bound (if any) followed by the interface bounds
    pub fn bounds(&self) -> impl Iterator<Item = &TypeSig> {
        self.class_bound.iter().chain(self.interface_bounds.iter())
    }
}

/// Generic signature of a class declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSig {
    pub type_params: Vec<TypeParamSig>,
    pub superclass: Option<ClassTypeSig>,
    pub interfaces: Vec<ClassTypeSig>,
}

/// Generic signature (or plain descriptor) of a method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub type_params: Vec<TypeParamSig>,
    pub params: Vec<TypeSig>,
    pub result: TypeSig,
    pub throws: Vec<TypeSig>,
}

/// Parses a field descriptor or field signature
pub fn parse_type(signature: &str) -> Result<TypeSig> {
    let mut reader = SignatureReader::new(signature);
    let sig = reader.java_type()?;
    reader.finish()?;
    Ok(sig)
}

/// Parses a method descriptor or method signature
pub fn parse_method(signature: &str) -> Result<MethodSig> {
    let mut reader = SignatureReader::new(signature);
    let type_params = reader.optional_type_params()?;
    reader.expect(b'(')?;
    let mut params = Vec::new();
    while reader.peek() != Some(b')') {
        params.push(reader.java_type()?);
    }
    reader.expect(b')')?;
    let result = if reader.peek() == Some(b'V') {
        reader.bump();
        TypeSig::Base(BaseType::Void)
    } else {
        reader.java_type()?
    };
    let mut throws = Vec::new();
    while reader.peek() == Some(b'^') {
        reader.bump();
        throws.push(reader.reference_type()?);
    }
    reader.finish()?;
    Ok(MethodSig {
        type_params,
        params,
        result,
        throws,
    })
}

/// Parses a class signature
pub fn parse_class(signature: &str) -> Result<ClassSig> {
    let mut reader = SignatureReader::new(signature);
    let type_params = reader.optional_type_params()?;
    let superclass = Some(reader.class_type()?);
    let mut interfaces = Vec::new();
    while reader.peek() == Some(b'L') {
        interfaces.push(reader.class_type()?);
    }
    reader.finish()?;
    Ok(ClassSig {
        type_params,
        superclass,
        interfaces,
    })
}

/// Converts an internal name (`java/lang/String`) to a binary name (`java.lang.String`)
pub fn binary_name(internal: &str) -> String {
    internal.replace('/', ".")
}

struct SignatureReader<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SignatureReader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Signature {
            signature: self.input.to_string(),
            offset: self.pos,
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => {
                self.pos -= 1;
                Err(self.error(format!(
                    "expected '{}', found '{}'",
                    expected as char, c as char
                )))
            }
            None => Err(self.error(format!(
                "expected '{}', found end of input",
                expected as char
            ))),
        }
    }

    fn finish(&self) -> Result<()> {
        if self.pos == self.bytes.len() {
            Ok(())
        } else {
            Err(self.error("unexpected trailing characters"))
        }
    }

    /// Reads a non-empty run of characters up to (not including) one of `stops`
    fn identifier(&mut self, stops: &[u8]) -> Result<&'a str> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if stops.contains(&c) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        if self.peek().is_none() {
            return Err(self.error("unterminated identifier"));
        }
        Ok(&self.input[start..self.pos])
    }

    fn java_type(&mut self) -> Result<TypeSig> {
        match self.peek() {
            Some(b'V') => Err(self.error("void is only valid as a method result")),
            Some(c) => match BaseType::from_descriptor(c) {
                Some(base) => {
                    self.bump();
                    Ok(TypeSig::Base(base))
                }
                None => self.reference_type(),
            },
            None => Err(self.error("expected type, found end of input")),
        }
    }

    fn reference_type(&mut self) -> Result<TypeSig> {
        match self.peek() {
            Some(b'L') => Ok(TypeSig::Class(self.class_type()?)),
            Some(b'T') => {
                self.bump();
                let name = self.identifier(b";")?;
                self.expect(b';')?;
                Ok(TypeSig::Variable(name.to_string()))
            }
            Some(b'[') => {
                self.bump();
                Ok(TypeSig::Array(Box::new(self.java_type()?)))
            }
            Some(c) => Err(self.error(format!("unexpected '{}'", c as char))),
            None => Err(self.error("expected reference type, found end of input")),
        }
    }

    fn class_type(&mut self) -> Result<ClassTypeSig> {
        self.expect(b'L')?;
        let internal = self.identifier(b"<.;")?;
        let mut current = ClassTypeSig::raw(binary_name(internal));
        if self.peek() == Some(b'<') {
            current.type_args = self.type_args()?;
        }
        while self.peek() == Some(b'.') {
            self.bump();
            let simple = self.identifier(b"<.;")?;
            let name = format!("{}${}", current.name, simple);
            let type_args = if self.peek() == Some(b'<') {
                self.type_args()?
            } else {
                Vec::new()
            };
            current = ClassTypeSig {
                name,
                type_args,
                owner: Some(Box::new(current)),
            };
        }
        self.expect(b';')?;
        Ok(current)
    }

    fn type_args(&mut self) -> Result<Vec<TypeArg>> {
        self.expect(b'<')?;
        let mut args = Vec::new();
        while self.peek() != Some(b'>') {
            let arg = match self.peek() {
                Some(b'*') => {
                    self.bump();
                    TypeArg {
                        wildcard: Wildcard::Any,
                        bound: None,
                    }
                }
                Some(b'+') => {
                    self.bump();
                    TypeArg {
                        wildcard: Wildcard::Extends,
                        bound: Some(self.reference_type()?),
                    }
                }
                Some(b'-') => {
                    self.bump();
                    TypeArg {
                        wildcard: Wildcard::Super,
                        bound: Some(self.reference_type()?),
                    }
                }
                Some(_) => TypeArg {
                    wildcard: Wildcard::None,
                    bound: Some(self.reference_type()?),
                },
                None => return Err(self.error("unterminated type arguments")),
            };
            args.push(arg);
        }
        self.expect(b'>')?;
        if args.is_empty() {
            return Err(self.error("empty type argument list"));
        }
        Ok(args)
    }

    fn optional_type_params(&mut self) -> Result<Vec<TypeParamSig>> {
        if self.peek() != Some(b'<') {
            return Ok(Vec::new());
        }
        self.bump();
        let mut params = Vec::new();
        while self.peek() != Some(b'>') {
            if self.peek().is_none() {
                return Err(self.error("unterminated type parameters"));
            }
            let name = self.identifier(b":")?.to_string();
            self.expect(b':')?;
            let class_bound = match self.peek() {
                Some(b'L') | Some(b'T') | Some(b'[') => Some(self.reference_type()?),
                _ => None,
            };
            let mut interface_bounds = Vec::new();
            while self.peek() == Some(b':') {
                self.bump();
                interface_bounds.push(self.reference_type()?);
            }
            params.push(TypeParamSig {
                name,
                class_bound,
                interface_bounds,
            });
        }
        self.expect(b'>')?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_types() {
        assert_eq!(parse_type("I").unwrap(), TypeSig::Base(BaseType::Int));
        assert_eq!(parse_type("J").unwrap(), TypeSig::Base(BaseType::Long));
        assert_eq!(parse_type("Z").unwrap(), TypeSig::Base(BaseType::Boolean));
    }

    #[test]
    fn test_void_is_rejected_as_field_type() {
        assert!(parse_type("V").is_err());
    }

    #[test]
    fn test_parse_plain_class_descriptor() {
        let sig = parse_type("Ljava/lang/String;").unwrap();
        assert_eq!(sig, TypeSig::Class(ClassTypeSig::raw("java.lang.String")));
    }

    #[test]
    fn test_parse_array_of_arrays() {
        let sig = parse_type("[[I").unwrap();
        assert_eq!(
            sig,
            TypeSig::Array(Box::new(TypeSig::Array(Box::new(TypeSig::Base(
                BaseType::Int
            )))))
        );
    }

    #[test]
    fn test_parse_parameterized_class() {
        let sig = parse_type("Ljava/util/Map<Ljava/lang/String;Ljava/util/List<TT;>;>;").unwrap();
        let TypeSig::Class(class) = sig else {
            panic!("Expected class signature");
        };
        assert_eq!(class.name, "java.util.Map");
        assert_eq!(class.type_args.len(), 2);
        assert_eq!(class.type_args[0].wildcard, Wildcard::None);
        let Some(TypeSig::Class(list)) = &class.type_args[1].bound else {
            panic!("Expected List argument");
        };
        assert_eq!(list.name, "java.util.List");
        assert_eq!(
            list.type_args[0].bound,
            Some(TypeSig::Variable("T".to_string()))
        );
    }

    #[test]
    fn test_parse_wildcards() {
        let sig = parse_type("Ljava/util/Map<*+Ljava/lang/Number;>;").unwrap();
        let TypeSig::Class(class) = sig else {
            panic!("Expected class signature");
        };
        assert_eq!(class.type_args[0].wildcard, Wildcard::Any);
        assert!(class.type_args[0].bound.is_none());
        assert_eq!(class.type_args[1].wildcard, Wildcard::Extends);

        let sig = parse_type("Ljava/util/List<-Ljava/lang/Integer;>;").unwrap();
        let TypeSig::Class(class) = sig else {
            panic!("Expected class signature");
        };
        assert_eq!(class.type_args[0].wildcard, Wildcard::Super);
    }

    #[test]
    fn test_parse_inner_class_of_generic_owner() {
        let sig = parse_type("Lcom/example/Outer<TT;>.Inner<Ljava/lang/String;>;").unwrap();
        let TypeSig::Class(class) = sig else {
            panic!("Expected class signature");
        };
        assert_eq!(class.name, "com.example.Outer$Inner");
        assert_eq!(class.type_args.len(), 1);
        let owner = class.owner.expect("owner should be recorded");
        assert_eq!(owner.name, "com.example.Outer");
        assert_eq!(owner.type_args[0].bound, Some(TypeSig::Variable("T".to_string())));
    }

    #[test]
    fn test_parse_method_descriptor() {
        let sig = parse_method("(Ljava/lang/String;I)V").unwrap();
        assert!(sig.type_params.is_empty());
        assert_eq!(sig.params.len(), 2);
        assert_eq!(sig.result, TypeSig::Base(BaseType::Void));
    }

    #[test]
    fn test_parse_generic_method_signature() {
        let sig =
            parse_method("<X:Ljava/lang/Object;>(TX;)Ljava/util/List<TX;>;^Ljava/io/IOException;")
                .unwrap();
        assert_eq!(sig.type_params.len(), 1);
        assert_eq!(sig.type_params[0].name, "X");
        assert_eq!(sig.params, vec![TypeSig::Variable("X".to_string())]);
        assert_eq!(sig.throws.len(), 1);
    }

    #[test]
    fn test_parse_class_signature_with_interface_bound() {
        let sig = parse_class(
            "<T::Ljava/lang/Comparable<TT;>;>Lcom/example/Base<TT;>;Ljava/io/Serializable;",
        )
        .unwrap();
        assert_eq!(sig.type_params.len(), 1);
        assert!(sig.type_params[0].class_bound.is_none());
        assert_eq!(sig.type_params[0].interface_bounds.len(), 1);
        assert_eq!(sig.superclass.unwrap().name, "com.example.Base");
        assert_eq!(sig.interfaces[0].name, "java.io.Serializable");
    }

    #[test]
    fn test_malformed_signatures_report_offset() {
        let err = parse_type("Ljava/lang/String").unwrap_err();
        assert!(matches!(err, Error::Signature { .. }));

        let err = parse_type("IX").unwrap_err();
        match err {
            Error::Signature { offset, .. } => assert_eq!(offset, 1),
            other => panic!("Unexpected error: {}", other),
        }

        assert!(parse_type("Ljava/util/List<>;").is_err());
        assert!(parse_method("(I").is_err());
    }
}
