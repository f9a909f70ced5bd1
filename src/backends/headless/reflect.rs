//! A declaration scanner for GLSL sources, good enough to reflect the uniforms,
//! uniform blocks and vertex inputs of well-formed shaders without a driver.
//!
//! Uniform blocks are laid out with the std140 rules.

use std::collections::HashMap;

use crate::backends::{ActiveUniform, ActiveUniformBlock};
use crate::program::{ScalarKind, UniformType};
use crate::types::ShaderStage;

/// A uniform or block member declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub ty: UniformType,
    pub name: String,
    /// Number of array elements, 1 for non-arrays.
    pub len: usize,
    pub row_major: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub instance: Option<String>,
    pub members: Vec<Variable>,
}

/// The interface of one shader stage.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    pub uniforms: Vec<Variable>,
    pub blocks: Vec<Block>,
    /// Vertex inputs with their explicit locations.
    pub inputs: Vec<(String, Option<u32>)>,
    pub main: bool,
}

/// The reflected interface of a linked program.
#[derive(Debug, Clone, Default)]
pub struct Interface {
    pub uniforms: Vec<ActiveUniform>,
    pub blocks: Vec<ActiveUniformBlock>,
    pub locations: HashMap<String, i32>,
    pub attributes: HashMap<String, u32>,
}

fn tokenize(source: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut word = String::new();

    while let Some(c) = chars.next() {
        if c.is_alphanumeric() || c == '_' || c == '.' {
            word.push(c);
            continue;
        }

        if !word.is_empty() {
            tokens.push(word.clone());
            word.clear();
        }

        match c {
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&n) = chars.peek() {
                    if n == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut last = ' ';
                for n in chars.by_ref() {
                    if last == '*' && n == '/' {
                        break;
                    }
                    last = n;
                }
            }
            '#' => {
                // Preprocessor directives run until the end of line.
                let mut line = String::from("#");
                while let Some(&n) = chars.peek() {
                    if n == '\n' {
                        break;
                    }
                    line.push(n);
                    chars.next();
                }
                tokens.push(line);
            }
            c if c.is_whitespace() => {}
            c => tokens.push(c.to_string()),
        }
    }

    if !word.is_empty() {
        tokens.push(word);
    }

    tokens
}

const QUALIFIERS: [&str; 12] = [
    "highp", "mediump", "lowp", "flat", "smooth", "noperspective", "const", "invariant",
    "centroid", "sample", "patch", "precise",
];

/// Removes `layout(...)` and precision-like qualifiers, returning the layout
/// identifiers together with their values.
fn strip_qualifiers(tokens: &[String]) -> (Vec<String>, Vec<(String, Option<String>)>) {
    let mut out = Vec::new();
    let mut layout = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        if tokens[i] == "layout" && tokens.get(i + 1).map(|v| v.as_str()) == Some("(") {
            i += 2;
            while i < tokens.len() && tokens[i] != ")" {
                if tokens[i] != "," {
                    let key = tokens[i].clone();
                    if tokens.get(i + 1).map(|v| v.as_str()) == Some("=") {
                        layout.push((key, tokens.get(i + 2).cloned()));
                        i += 2;
                    } else {
                        layout.push((key, None));
                    }
                }
                i += 1;
            }
        } else if !QUALIFIERS.contains(&tokens[i].as_str()) {
            out.push(tokens[i].clone());
        }

        i += 1;
    }

    (out, layout)
}

fn has_layout(layout: &[(String, Option<String>)], key: &str) -> bool {
    layout.iter().any(|v| v.0 == key)
}

/// Parses `TYPE name[N], other;` into variables. Declarations of unknown types
/// (structures) are skipped.
fn variables(tokens: &[String], row_major: bool) -> Result<Vec<Variable>, String> {
    let mut vars = Vec::new();
    let ty = match tokens.first() {
        Some(v) => v,
        None => return Ok(vars),
    };

    let ty = match UniformType::from_glsl(ty) {
        Some(ty) => ty,
        None => return Ok(vars),
    };

    let mut i = 1;
    while i < tokens.len() {
        let name = tokens[i].clone();
        let mut len = 1;
        i += 1;

        if tokens.get(i).map(|v| v.as_str()) == Some("[") {
            len = tokens
                .get(i + 1)
                .and_then(|v| v.parse::<usize>().ok())
                .ok_or_else(|| format!("'{}' : array size must be a constant integer", name))?;
            i += 3;
        }

        if tokens.get(i).map(|v| v.as_str()) == Some("=") {
            // Skips initializers.
            while i < tokens.len() && tokens[i] != "," {
                i += 1;
            }
        }

        vars.push(Variable {
            ty,
            name,
            len,
            row_major,
        });

        i += 1;
    }

    Ok(vars)
}

/// Scans the declarations of a shader source.
pub fn scan(stage: ShaderStage, source: &str) -> Result<Declarations, String> {
    let tokens = tokenize(source);
    let mut decls = Declarations::default();

    if tokens.is_empty() {
        return Err("ERROR: 0:0: '' : empty shader source".into());
    }

    let mut stmt: Vec<String> = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        i += 1;

        if token.starts_with("#error") {
            return Err(format!("ERROR: 0:0: '#error' : {}", token[6..].trim()));
        }

        if token.starts_with('#') {
            continue;
        }

        match token.as_str() {
            ";" => {
                statement(stage, &stmt, &mut decls)?;
                stmt.clear();
            }
            "{" => {
                let mut depth = 1;
                let start = i;
                while i < tokens.len() && depth > 0 {
                    match tokens[i].as_str() {
                        "{" => depth += 1,
                        "}" => depth -= 1,
                        _ => {}
                    }
                    i += 1;
                }

                if depth > 0 {
                    return Err("ERROR: 0:0: '' : unexpected end of file".into());
                }

                let body = &tokens[start..i - 1];
                let (head, layout) = strip_qualifiers(&stmt);

                if head.first().map(|v| v.as_str()) == Some("uniform") && head.len() == 2 {
                    let row_major = has_layout(&layout, "row_major");
                    let block = parse_block(head[1].clone(), body, row_major)?;

                    let mut tail = Vec::new();
                    while i < tokens.len() && tokens[i] != ";" {
                        tail.push(tokens[i].clone());
                        i += 1;
                    }
                    i += 1;

                    decls.blocks.push(Block {
                        instance: tail.first().cloned(),
                        ..block
                    });
                } else if head.len() >= 2 && head[1] == "main" {
                    decls.main = true;
                } else if head.first().map(|v| v.as_str()) == Some("struct") {
                    // Skips the declarators following a structure definition.
                    while i < tokens.len() && tokens[i] != ";" {
                        i += 1;
                    }
                    i += 1;
                }

                stmt.clear();
            }
            "}" => return Err("ERROR: 0:0: '}' : syntax error".into()),
            _ => stmt.push(token.clone()),
        }
    }

    if !stmt.is_empty() {
        return Err(format!(
            "ERROR: 0:0: '{}' : syntax error, missing ';'",
            stmt.join(" ")
        ));
    }

    Ok(decls)
}

fn parse_block(name: String, body: &[String], row_major: bool) -> Result<Block, String> {
    let mut members = Vec::new();
    for stmt in body.split(|v| v == ";") {
        let (tokens, layout) = strip_qualifiers(stmt);
        let row_major = if has_layout(&layout, "row_major") {
            true
        } else if has_layout(&layout, "column_major") {
            false
        } else {
            row_major
        };

        members.extend(variables(&tokens, row_major)?);
    }

    Ok(Block {
        name,
        instance: None,
        members,
    })
}

fn statement(stage: ShaderStage, stmt: &[String], decls: &mut Declarations) -> Result<(), String> {
    let (tokens, layout) = strip_qualifiers(stmt);
    let head = match tokens.first() {
        Some(v) => v.as_str(),
        None => return Ok(()),
    };

    match head {
        "uniform" => {
            decls.uniforms.extend(variables(&tokens[1..], false)?);
        }
        "in" | "attribute" if stage == ShaderStage::Vertex => {
            let location = layout
                .iter()
                .find(|v| v.0 == "location")
                .and_then(|v| v.1.as_ref())
                .and_then(|v| v.parse().ok());

            for v in variables(&tokens[1..], false)? {
                decls.inputs.push((v.name, location));
            }
        }
        _ => {}
    }

    Ok(())
}

#[inline]
fn round_up(v: usize, align: usize) -> usize {
    (v + align - 1) / align * align
}

/// The std140 layout of one member: base alignment, size of one element,
/// array stride and matrix stride.
fn std140(v: &Variable) -> (usize, usize, usize, usize) {
    let (kind, cols, rows) = match v.ty {
        UniformType::Vector(kind, n) => (kind, 1, n as usize),
        UniformType::Matrix(kind, c, r) => (kind, c as usize, r as usize),
        UniformType::Sampler(_) => (ScalarKind::Int, 1, 1),
    };

    let scalar = kind.size();
    let (align, size, matrix_stride) = if cols == 1 && v.len == 1 {
        let align = match rows {
            1 => scalar,
            2 => scalar * 2,
            _ => scalar * 4,
        };
        (align, scalar * rows, 0)
    } else if cols == 1 {
        let stride = round_up(scalar * rows, 16);
        (stride, stride, 0)
    } else {
        let (major, minor) = if v.row_major { (rows, cols) } else { (cols, rows) };
        let stride = round_up(scalar * minor, 16);
        (stride, stride * major, stride)
    };

    let array_stride = if v.len > 1 { round_up(size, 16) } else { 0 };
    (align.max(if v.len > 1 { 16 } else { 0 }), size, array_stride, matrix_stride)
}

/// Links the interfaces of several stages.
pub fn link(stages: &[(ShaderStage, &Declarations)]) -> Result<Interface, String> {
    let mut interface = Interface::default();
    let mut next_location = 0;

    for &(stage, decls) in stages {
        if !decls.main {
            return Err(format!("ERROR: {:?} shader has no main function", stage));
        }

        for v in &decls.uniforms {
            if let Some(prev) = interface.uniforms.iter().find(|u| u.name == v.name) {
                if prev.ty != v.ty || prev.size != v.len {
                    return Err(format!(
                        "ERROR: uniform '{}' differs on precision or type between stages",
                        v.name
                    ));
                }
                continue;
            }

            interface.locations.insert(v.name.clone(), next_location);
            for i in 0..v.len {
                let name = format!("{}[{}]", v.name, i);
                interface.locations.insert(name, next_location + i as i32);
            }

            next_location += v.len as i32;
            interface.uniforms.push(ActiveUniform {
                name: v.name.clone(),
                ty: v.ty,
                size: v.len,
                block: None,
                offset: 0,
                array_stride: 0,
                matrix_stride: 0,
                row_major: false,
            });
        }

        for b in &decls.blocks {
            if interface.blocks.iter().any(|v| v.name == b.name) {
                continue;
            }

            let index = interface.blocks.len() as u32;
            let mut offset = 0;
            for m in &b.members {
                let (align, size, array_stride, matrix_stride) = std140(m);
                offset = round_up(offset, align);

                let name = if b.instance.is_some() {
                    format!("{}.{}", b.name, m.name)
                } else {
                    m.name.clone()
                };

                interface.uniforms.push(ActiveUniform {
                    name,
                    ty: m.ty,
                    size: m.len,
                    block: Some(index),
                    offset,
                    array_stride,
                    matrix_stride,
                    row_major: m.row_major,
                });

                offset += if m.len > 1 { array_stride * m.len } else { size };
            }

            interface.blocks.push(ActiveUniformBlock {
                index,
                name: b.name.clone(),
                size: round_up(offset, 16),
                members: b.members.len(),
            });
        }

        if stage == ShaderStage::Vertex {
            let mut next = 0;
            for &(ref name, location) in &decls.inputs {
                let location = location.unwrap_or(next);
                next = location + 1;
                interface.attributes.insert(name.clone(), location);
            }
        }
    }

    Ok(interface)
}
