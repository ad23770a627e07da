//! Layout model parsed from Rust `#[repr(C)]` source
//!
//! Both generators work from the same parsed model, so a struct has the
//! same field order and widths in every target language.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use syn::{Attribute, Fields, Item, Type};

/// Type mapping from Rust to the target languages
#[derive(Debug, PartialEq, Eq)]
pub struct TypeMapping {
    pub rust_type: &'static str,
    pub c_type: &'static str,
    pub csharp_type: &'static str,
}

const TYPE_MAPPINGS: &[TypeMapping] = &[
    TypeMapping {
        rust_type: "u8",
        c_type: "uint8_t",
        csharp_type: "byte",
    },
    TypeMapping {
        rust_type: "i8",
        c_type: "int8_t",
        csharp_type: "sbyte",
    },
    TypeMapping {
        rust_type: "c_char",
        c_type: "char",
        csharp_type: "sbyte",
    },
    TypeMapping {
        rust_type: "u16",
        c_type: "uint16_t",
        csharp_type: "ushort",
    },
    TypeMapping {
        rust_type: "i16",
        c_type: "int16_t",
        csharp_type: "short",
    },
    TypeMapping {
        rust_type: "u32",
        c_type: "uint32_t",
        csharp_type: "uint",
    },
    TypeMapping {
        rust_type: "i32",
        c_type: "int32_t",
        csharp_type: "int",
    },
    TypeMapping {
        rust_type: "u64",
        c_type: "uint64_t",
        csharp_type: "ulong",
    },
    TypeMapping {
        rust_type: "i64",
        c_type: "int64_t",
        csharp_type: "long",
    },
    TypeMapping {
        rust_type: "usize",
        c_type: "size_t",
        csharp_type: "nuint",
    },
    TypeMapping {
        rust_type: "isize",
        c_type: "ptrdiff_t",
        csharp_type: "nint",
    },
    TypeMapping {
        rust_type: "f32",
        c_type: "float",
        csharp_type: "float",
    },
    TypeMapping {
        rust_type: "f64",
        c_type: "double",
        csharp_type: "double",
    },
    TypeMapping {
        rust_type: "bool",
        c_type: "bool",
        csharp_type: "bool",
    },
];

/// Look up the mapping of a primitive Rust type name
pub fn lookup(rust_type: &str) -> Option<&'static TypeMapping> {
    TYPE_MAPPINGS.iter().find(|m| m.rust_type == rust_type)
}

/// Type of a field in a `#[repr(C)]` struct
#[derive(Debug, PartialEq, Eq)]
pub enum FieldType {
    Scalar(&'static TypeMapping),
    Array { elem: Box<FieldType>, len: String },
    Pointer { elem: Box<FieldType>, mutable: bool },
}

/// A parsed `#[repr(C)]` struct
#[derive(Debug)]
pub struct ReprStruct {
    pub name: String,
    pub fields: Vec<ReprField>,
    pub doc_comment: Option<String>,
}

/// A field within a `#[repr(C)]` struct
#[derive(Debug)]
pub struct ReprField {
    pub name: String,
    pub ty: FieldType,
    pub doc_comment: Option<String>,
}

/// An integer constant (`MSG_` or `NB_` prefixed)
#[derive(Debug)]
pub struct ReprConstant {
    pub name: String,
    pub ty: &'static TypeMapping,
    pub value: String,
    pub doc_comment: Option<String>,
}

/// Everything the generators need from one source file
#[derive(Debug, Default)]
pub struct LayoutFile {
    pub structs: Vec<ReprStruct>,
    pub constants: Vec<ReprConstant>,
    /// Structs skipped because a field type has no mapping
    pub skipped: Vec<String>,
}

/// Prefixes of constants exported to generated code
const CONSTANT_PREFIXES: &[&str] = &["MSG_", "NB_"];

/// Parse a Rust source file
pub fn parse_file(source_path: &Path) -> Result<LayoutFile> {
    let source = fs::read_to_string(source_path)
        .with_context(|| format!("Failed to read source file: {}", source_path.display()))?;

    parse_source(&source)
        .with_context(|| format!("Failed to parse Rust file: {}", source_path.display()))
}

/// Parse Rust source text and extract `#[repr(C)]` structs and constants
pub fn parse_source(source: &str) -> Result<LayoutFile> {
    let ast = syn::parse_file(source)?;

    let mut layout = LayoutFile::default();

    for item in ast.items {
        match item {
            Item::Struct(s) if is_repr_c(&s.attrs) => match parse_struct(&s) {
                Some(repr_struct) => layout.structs.push(repr_struct),
                None => layout.skipped.push(s.ident.to_string()),
            },
            Item::Const(c) => {
                if let Some(constant) = parse_constant(&c) {
                    layout.constants.push(constant);
                }
            }
            _ => {}
        }
    }

    Ok(layout)
}

/// Check if a struct has `#[repr(C)]`, alone or with other hints
fn is_repr_c(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        if !attr.path().is_ident("repr") {
            return false;
        }
        let mut found = false;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("C") {
                found = true;
            }
            // Skip arguments such as align(8)
            if meta.input.peek(syn::token::Paren) {
                let _args;
                syn::parenthesized!(_args in meta.input);
            }
            Ok(())
        });
        found
    })
}

/// Extract doc comment from attributes
fn extract_doc_comment(attrs: &[Attribute]) -> Option<String> {
    let docs: Vec<String> = attrs
        .iter()
        .filter_map(|attr| {
            if !attr.path().is_ident("doc") {
                return None;
            }
            match &attr.meta {
                syn::Meta::NameValue(syn::MetaNameValue {
                    value:
                        syn::Expr::Lit(syn::ExprLit {
                            lit: syn::Lit::Str(s),
                            ..
                        }),
                    ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            }
        })
        .collect();

    if docs.is_empty() {
        None
    } else {
        Some(docs.join("\n"))
    }
}

/// Parse a syn struct; `None` if it has unnamed fields or an unmapped type
fn parse_struct(s: &syn::ItemStruct) -> Option<ReprStruct> {
    let named = match &s.fields {
        Fields::Named(named) => named,
        _ => return None,
    };

    let fields = named
        .named
        .iter()
        .map(|field| {
            Some(ReprField {
                name: field.ident.as_ref()?.to_string(),
                ty: parse_type(&field.ty)?,
                doc_comment: extract_doc_comment(&field.attrs),
            })
        })
        .collect::<Option<Vec<_>>>()?;

    Some(ReprStruct {
        name: s.ident.to_string(),
        fields,
        doc_comment: extract_doc_comment(&s.attrs),
    })
}

/// Parse a constant definition
fn parse_constant(c: &syn::ItemConst) -> Option<ReprConstant> {
    let name = c.ident.to_string();

    if !CONSTANT_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return None;
    }

    let ty = match parse_type(&c.ty)? {
        FieldType::Scalar(mapping) => mapping,
        _ => return None,
    };

    let value = int_literal(&c.expr)?;

    Some(ReprConstant {
        name,
        ty,
        value,
        doc_comment: extract_doc_comment(&c.attrs),
    })
}

/// Integer literal value, allowing a leading minus
fn int_literal(expr: &syn::Expr) -> Option<String> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(i),
            ..
        }) => Some(i.base10_digits().to_string()),
        syn::Expr::Unary(syn::ExprUnary {
            op: syn::UnOp::Neg(_),
            expr,
            ..
        }) => int_literal(expr).map(|digits| format!("-{digits}")),
        _ => None,
    }
}

/// Convert a Rust type to the layout model
pub fn parse_type(ty: &Type) -> Option<FieldType> {
    match ty {
        Type::Path(path) => {
            let ident = path.path.segments.last()?.ident.to_string();
            lookup(&ident).map(FieldType::Scalar)
        }
        Type::Array(arr) => {
            let elem = parse_type(&arr.elem)?;
            let len = match &arr.len {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Int(i),
                    ..
                }) => i.base10_digits().to_string(),
                _ => return None,
            };
            Some(FieldType::Array {
                elem: Box::new(elem),
                len,
            })
        }
        Type::Ptr(ptr) => Some(FieldType::Pointer {
            elem: Box::new(parse_type(&ptr.elem)?),
            mutable: ptr.mutability.is_some(),
        }),
        _ => None,
    }
}
