//! RST writer for [`DocumentSection`] trees.

use super::document::{Block, BulletItem, DocumentSection, Property, PropertyValue};

const INDENT: &str = "    ";

/// Render a section tree to RST text.
///
/// Blocks are separated by exactly one blank line and the text ends with a
/// single newline. Code listings keep their inner blank lines.
pub fn emit(section: &DocumentSection) -> String {
    let mut out = String::new();
    write_section(&mut out, section);
    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

fn write_section(out: &mut String, section: &DocumentSection) {
    if let Some(label) = &section.label {
        out.push_str(&format!(".. _{label}:\n\n"));
    }

    let rule: String = std::iter::repeat_n(section.level.marker(), section.title.chars().count()).collect();
    if section.level.has_overline() {
        out.push_str(&rule);
        out.push('\n');
    }
    out.push_str(&section.title);
    out.push('\n');
    out.push_str(&rule);
    out.push_str("\n\n");

    for block in &section.blocks {
        let text = render_block(block);
        if !text.is_empty() {
            out.push_str(&text);
            out.push('\n');
        }
    }
    for subsection in &section.subsections {
        write_section(out, subsection);
    }
}

fn render_block(block: &Block) -> String {
    if let Block::Code { language, text } = block {
        let mut out = format!(".. code-block:: {language}\n{INDENT}:linenos:\n\n");
        out.push_str(&indent(trim_blank_edges(text), INDENT));
        return out;
    }
    let mut out = String::new();
    write_block(&mut out, block);
    normalize_blank_lines(&out)
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Paragraph(text) => {
            out.push_str(text);
            out.push('\n');
        }
        Block::PropertyList(properties) => write_properties(out, properties),
        Block::BulletTree(items) => write_items(out, items, ""),
        Block::FieldTable(table) => out.push_str(&table.render()),
        Block::Code { .. } => out.push_str(&render_block(block)),
        Block::Warning(text) => {
            out.push_str(".. warning::\n\n");
            out.push_str(&indent(text, INDENT));
        }
    }
}

fn write_properties(out: &mut String, properties: &[Property]) {
    for property in properties {
        match &property.value {
            PropertyValue::Text(value) => {
                out.push_str(&format!("* **{}:** {value}\n", property.name));
            }
            PropertyValue::List(items) => {
                out.push_str(&format!("* **{}:**\n\n", property.name));
                for item in items {
                    out.push_str(&format!("{INDENT}* {item}\n"));
                }
                out.push('\n');
            }
        }
    }
}

fn write_items(out: &mut String, items: &[BulletItem], prefix: &str) {
    for item in items {
        out.push_str(&format!("{prefix}* {}\n", item.text));
        if !item.children.is_empty() {
            out.push('\n');
            write_items(out, &item.children, &format!("{prefix}{INDENT}"));
            out.push('\n');
        }
    }
}

/// Indent every non-empty line of `text`.
fn indent(text: &str, prefix: &str) -> String {
    let mut out = String::new();
    for line in text.lines() {
        if !line.trim().is_empty() {
            out.push_str(prefix);
            out.push_str(line.trim_end());
        }
        out.push('\n');
    }
    out
}

/// Drop blank lines before the first and after the last line of `text`.
fn trim_blank_edges(text: &str) -> &str {
    let start = text
        .find(|c: char| !c.is_whitespace())
        .map_or(text.len(), |first| {
            text[..first].rfind('\n').map_or(0, |newline| newline + 1)
        });
    text[start..].trim_end()
}

/// Strip trailing spaces and collapse runs of blank lines.
fn normalize_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank = true;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if !blank {
                out.push('\n');
            }
            blank = true;
        } else {
            out.push_str(line);
            out.push('\n');
            blank = false;
        }
    }
    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}
