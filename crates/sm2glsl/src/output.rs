//! Multi-section text buffer the code generator writes into.

use std::fmt::Write;

/// Output sections, concatenated in declaration order (except [`Section::Ignore`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Section {
    Preflight,
    Globals,
    Inputs,
    Outputs,
    Helpers,
    Subroutines,
    MainLineIntro,
    MainLineArguments,
    MainLineTop,
    MainLine,
    Postflight,
    /// Parsed and validated, never emitted (e.g. bodies of uncalled labels).
    Ignore,
}

const SECTION_COUNT: usize = 12;

const CONCAT_ORDER: [Section; SECTION_COUNT - 1] = [
    Section::Preflight,
    Section::Globals,
    Section::Inputs,
    Section::Outputs,
    Section::Helpers,
    Section::Subroutines,
    Section::MainLineIntro,
    Section::MainLineArguments,
    Section::MainLineTop,
    Section::MainLine,
    Section::Postflight,
];

#[derive(Debug, Clone)]
pub(crate) struct OutputBuffer {
    sections: [String; SECTION_COUNT],
    current: Section,
    pub indent: i32,
    stack: Vec<(Section, i32)>,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self {
            sections: Default::default(),
            current: Section::MainLine,
            indent: 0,
            stack: Vec::new(),
        }
    }
}

impl OutputBuffer {
    pub fn current(&self) -> Section {
        self.current
    }

    /// Switches sections without touching the indent level.
    pub fn set(&mut self, section: Section) {
        self.current = section;
    }

    /// Redirects output to `section` at indent zero until the matching [`Self::pop`].
    pub fn push(&mut self, section: Section) {
        self.stack.push((self.current, self.indent));
        self.current = section;
        self.indent = 0;
    }

    pub fn pop(&mut self) {
        if let Some((section, indent)) = self.stack.pop() {
            self.current = section;
            self.indent = indent;
        }
    }

    pub fn line(&mut self, text: &str) {
        let indent = self.indent.max(0) as usize;
        let buf = &mut self.sections[self.current as usize];
        for _ in 0..indent {
            buf.push('\t');
        }
        let _ = writeln!(buf, "{text}");
    }

    pub fn blank_line(&mut self) {
        self.sections[self.current as usize].push('\n');
    }

    pub fn section(&self, section: Section) -> &str {
        &self.sections[section as usize]
    }

    /// Joins every emitted section in the fixed output order.
    pub fn finish(&self) -> String {
        let len = CONCAT_ORDER.iter().map(|s| self.section(*s).len()).sum();
        let mut out = String::with_capacity(len);
        for section in CONCAT_ORDER {
            out.push_str(self.section(section));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_restores_section_and_indent() {
        let mut out = OutputBuffer::default();
        out.indent = 2;
        out.line("a = b;");
        out.push(Section::Globals);
        out.line("vec4 r0;");
        out.indent += 1;
        out.pop();
        assert_eq!(out.current(), Section::MainLine);
        assert_eq!(out.indent, 2);
        out.line("c = d;");

        assert_eq!(out.section(Section::MainLine), "\t\ta = b;\n\t\tc = d;\n");
        assert_eq!(out.section(Section::Globals), "vec4 r0;\n");
    }

    #[test]
    fn finish_skips_ignored_section() {
        let mut out = OutputBuffer::default();
        out.set(Section::Ignore);
        out.line("void unused() {");
        out.set(Section::Postflight);
        out.line("// tail");
        out.set(Section::Preflight);
        out.line("#version 110");
        assert_eq!(out.finish(), "#version 110\n// tail\n");
    }
}
