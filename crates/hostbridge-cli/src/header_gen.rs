//! C header generation from Rust `#[repr(C)]` structs

use crate::layout::{FieldType, LayoutFile, parse_file};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// C spelling of a field type, without the array suffix
fn c_base_type(ty: &FieldType) -> String {
    match ty {
        FieldType::Scalar(mapping) => mapping.c_type.to_string(),
        FieldType::Array { elem, .. } => c_base_type(elem),
        FieldType::Pointer { elem, mutable } => {
            let elem_type = c_base_type(elem);
            if *mutable {
                format!("{elem_type}*")
            } else {
                format!("const {elem_type}*")
            }
        }
    }
}

/// Array suffix in C declarator syntax (`[4][8]` for `[[T; 8]; 4]`)
fn c_array_suffix(ty: &FieldType) -> String {
    match ty {
        FieldType::Array { elem, len } => format!("[{len}]{}", c_array_suffix(elem)),
        _ => String::new(),
    }
}

/// Append a block doc comment
fn push_block_doc(output: &mut String, doc: &str, indent: &str) {
    output.push_str(&format!("{indent}/**\n"));
    for line in doc.lines() {
        if line.is_empty() {
            output.push_str(&format!("{indent} *\n"));
        } else {
            output.push_str(&format!("{indent} * {line}\n"));
        }
    }
    output.push_str(&format!("{indent} */\n"));
}

/// Generate C header content from a parsed layout
pub fn generate_header(layout: &LayoutFile, source_name: &str) -> String {
    let mut output = String::new();

    // Header guard
    let guard_name = source_name.to_uppercase().replace(['.', '-'], "_");
    output.push_str("// Auto-generated by hostbridge generate-header\n");
    output.push_str(&format!("// Source: {source_name}\n"));
    output.push_str("// DO NOT EDIT - regenerate with: hostbridge generate-header\n\n");
    output.push_str(&format!("#ifndef {guard_name}_H\n"));
    output.push_str(&format!("#define {guard_name}_H\n\n"));
    output.push_str("#include <stdint.h>\n");
    output.push_str("#include <stdbool.h>\n");
    output.push_str("#include <stddef.h>\n\n");
    output.push_str("#ifdef __cplusplus\n");
    output.push_str("extern \"C\" {\n");
    output.push_str("#endif\n\n");

    // Constants
    if !layout.constants.is_empty() {
        output.push_str("// Constants\n");
        for constant in &layout.constants {
            if let Some(doc) = &constant.doc_comment {
                output.push_str(&format!("/** {} */\n", doc.replace('\n', " ")));
            }
            output.push_str(&format!(
                "#define {} (({}){})\n",
                constant.name, constant.ty.c_type, constant.value
            ));
        }
        output.push('\n');
    }

    // Structs
    for repr_struct in &layout.structs {
        if let Some(doc) = &repr_struct.doc_comment {
            push_block_doc(&mut output, doc, "");
        }
        output.push_str(&format!("typedef struct {} {{\n", repr_struct.name));

        for field in &repr_struct.fields {
            if let Some(doc) = &field.doc_comment {
                output.push_str(&format!("    /** {} */\n", doc.replace('\n', " ")));
            }
            output.push_str(&format!(
                "    {} {}{};\n",
                c_base_type(&field.ty),
                field.name,
                c_array_suffix(&field.ty)
            ));
        }

        output.push_str(&format!("}} {};\n\n", repr_struct.name));
    }

    // Footer
    output.push_str("#ifdef __cplusplus\n");
    output.push_str("}\n");
    output.push_str("#endif\n\n");
    output.push_str(&format!("#endif // {guard_name}_H\n"));

    output
}

/// Name of the source file used in guards and banners
pub fn source_name(source_path: &Path) -> String {
    source_path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Run the header generation command
pub fn run(source: &str, output: &str) -> Result<()> {
    let source_path = Path::new(source);
    let output_path = Path::new(output);

    println!("Parsing Rust source: {}", source_path.display());
    let layout = parse_file(source_path)?;

    for name in &layout.skipped {
        eprintln!("Skipping {name}: field type has no C mapping");
    }
    if layout.structs.is_empty() {
        anyhow::bail!("No #[repr(C)] structs found in {}", source_path.display());
    }

    println!(
        "Found {} struct(s) and {} constant(s)",
        layout.structs.len(),
        layout.constants.len()
    );

    let header = generate_header(&layout, &source_name(source_path));

    fs::write(output_path, &header)
        .with_context(|| format!("Failed to write header file: {}", output_path.display()))?;

    println!("Generated header: {}", output_path.display());

    Ok(())
}
