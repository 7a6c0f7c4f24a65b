use super::Environment;
use std::fmt::Write;

/// Renders a set of frames and their parent links as a Graphviz digraph.
///
/// Frames are numbered by their position in the slice. Parents outside the
/// slice are left out.
pub struct DotFormatter;

impl DotFormatter {
    pub fn format(&self, frames: &[Environment]) -> String {
        let mut buffer = String::from("digraph environment {\n    node [shape=box];\n");
        let index_of = |frame: &Environment| frames.iter().position(|other| other.ptr_eq(frame));

        for (index, frame) in frames.iter().enumerate() {
            let mut label = format!("frame {index}\\l");
            for (name, value) in frame.bindings() {
                label.push_str(&escape(&format!("{name} = {value}")));
                label.push_str("\\l");
            }
            let _ = writeln!(buffer, "    frame{index} [label=\"{label}\"];");
        }

        for (index, frame) in frames.iter().enumerate() {
            if let Some(parent) = frame.parent().as_ref().and_then(index_of) {
                let _ = writeln!(buffer, "    frame{index} -> frame{parent};");
            }
        }

        buffer.push_str("}\n");
        buffer
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\l"),
            c => escaped.push(c),
        }
    }
    escaped
}
