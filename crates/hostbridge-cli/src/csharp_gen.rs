//! C# struct generation from Rust `#[repr(C)]` structs
//!
//! Each struct becomes a `[StructLayout(LayoutKind.Sequential)]` struct with
//! the same field order and widths. Constants go into a static class named
//! after the source file.

use crate::header_gen::source_name;
use crate::layout::{FieldType, LayoutFile, ReprField, parse_file};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Convert a file stem to PascalCase (`fixed_layout` -> `FixedLayout`)
fn to_pascal_case(s: &str) -> String {
    s.split(['-', '_', '.'])
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}

/// Append the C# declaration of one field
fn push_field(code: &mut String, field: &ReprField) {
    match &field.ty {
        FieldType::Scalar(mapping) => {
            if mapping.rust_type == "bool" {
                code.push_str("        [MarshalAs(UnmanagedType.U1)]\n");
            }
            code.push_str(&format!(
                "        public {} {};\n",
                mapping.csharp_type, field.name
            ));
        }
        FieldType::Array { elem, len } => {
            // Nested arrays flatten to one inline run of elements
            let elem_type = match innermost(elem) {
                FieldType::Scalar(mapping) => mapping.csharp_type,
                _ => "IntPtr",
            };
            let size = flattened_len(&field.ty);
            code.push_str(&format!(
                "        [MarshalAs(UnmanagedType.ByValArray, SizeConst = {})]\n",
                size.unwrap_or_else(|| len.clone())
            ));
            code.push_str(&format!("        public {}[] {};\n", elem_type, field.name));
        }
        FieldType::Pointer { .. } => {
            code.push_str(&format!("        public IntPtr {};\n", field.name));
        }
    }
}

/// Element type of a (possibly nested) array
fn innermost(ty: &FieldType) -> &FieldType {
    match ty {
        FieldType::Array { elem, .. } => innermost(elem),
        other => other,
    }
}

/// Total element count of a (possibly nested) array of scalars
fn flattened_len(ty: &FieldType) -> Option<String> {
    match ty {
        FieldType::Array { elem, len } => {
            let outer: u64 = len.parse().ok()?;
            match elem.as_ref() {
                FieldType::Array { .. } => {
                    let inner: u64 = flattened_len(elem)?.parse().ok()?;
                    Some((outer * inner).to_string())
                }
                _ => Some(outer.to_string()),
            }
        }
        _ => None,
    }
}

/// Generate C# source from a parsed layout
pub fn generate_csharp(layout: &LayoutFile, namespace: &str, source_name: &str) -> String {
    let mut code = String::new();

    code.push_str("// Auto-generated by hostbridge generate-csharp\n");
    code.push_str(&format!("// Source: {source_name}\n"));
    code.push_str("// DO NOT EDIT - regenerate with: hostbridge generate-csharp\n\n");
    code.push_str("using System;\n");
    code.push_str("using System.Runtime.InteropServices;\n\n");
    code.push_str(&format!("namespace {namespace}\n{{\n"));

    let mut first = true;

    if !layout.constants.is_empty() {
        let stem = source_name.split('.').next().unwrap_or(source_name);
        code.push_str(&format!(
            "    public static class {}Constants\n    {{\n",
            to_pascal_case(stem)
        ));
        for constant in &layout.constants {
            if let Some(doc) = &constant.doc_comment {
                code.push_str(&format!(
                    "        /// <summary>{}</summary>\n",
                    doc.replace('\n', " ")
                ));
            }
            code.push_str(&format!(
                "        public const {} {} = {};\n",
                constant.ty.csharp_type, constant.name, constant.value
            ));
        }
        code.push_str("    }\n");
        first = false;
    }

    for repr_struct in &layout.structs {
        if !first {
            code.push('\n');
        }
        first = false;

        if let Some(doc) = &repr_struct.doc_comment {
            code.push_str("    /// <summary>\n");
            for line in doc.lines() {
                code.push_str(&format!("    /// {}\n", line));
            }
            code.push_str("    /// </summary>\n");
        }
        code.push_str("    [StructLayout(LayoutKind.Sequential)]\n");
        code.push_str(&format!("    public struct {}\n    {{\n", repr_struct.name));

        for field in &repr_struct.fields {
            if let Some(doc) = &field.doc_comment {
                code.push_str(&format!(
                    "        /// <summary>{}</summary>\n",
                    doc.replace('\n', " ")
                ));
            }
            push_field(&mut code, field);
        }

        code.push_str("    }\n");
    }

    code.push_str("}\n");
    code
}

/// Run the C# generation command
pub fn run(source: &str, output: &str, namespace: &str) -> Result<()> {
    let source_path = Path::new(source);
    let output_path = Path::new(output);

    println!("Parsing Rust source: {}", source_path.display());
    let layout = parse_file(source_path)?;

    for name in &layout.skipped {
        eprintln!("Skipping {name}: field type has no C# mapping");
    }
    if layout.structs.is_empty() {
        anyhow::bail!("No #[repr(C)] structs found in {}", source_path.display());
    }

    let code = generate_csharp(&layout, namespace, &source_name(source_path));

    fs::write(output_path, &code)
        .with_context(|| format!("Failed to write C# file: {}", output_path.display()))?;

    println!(
        "Generated {} struct(s) in namespace {}: {}",
        layout.structs.len(),
        namespace,
        output_path.display()
    );

    Ok(())
}
